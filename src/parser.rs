use crate::casefold::CaseRule;
use crate::models::{DumpItem, SiteInfo, WikiPage};
use crate::namespace::Namespace;
use anyhow::{bail, Context, Result};
use bzip2::read::MultiBzDecoder;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::mem;
use std::str::FromStr;

const READ_BUFFER_SIZE: usize = 256 * 1024;

/// Streaming reader over a MediaWiki XML export.
///
/// Yields the `<siteinfo>` header and then one item per `<page>`, never
/// holding more than a single page in memory.
pub struct WikiReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    done: bool,
}

impl WikiReader<Box<dyn BufRead>> {
    pub fn open(path: &str) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Failed to open dump: {}", path))?;
        Ok(Self::from_reader(decompressed(file)?))
    }

    pub fn stdin() -> Result<Self> {
        Ok(Self::from_reader(decompressed(io::stdin())?))
    }
}

/// Wraps `input` in a bzip2 decoder when it starts with the bzip2 magic.
/// Multistream archives (as published for Wikipedia) are read to the end.
fn decompressed<R: Read + 'static>(input: R) -> Result<Box<dyn BufRead>> {
    let mut buffered = BufReader::with_capacity(READ_BUFFER_SIZE, input);
    let is_bzip2 = buffered
        .fill_buf()
        .context("Failed to read dump header")?
        .starts_with(b"BZh");

    if is_bzip2 {
        Ok(Box::new(BufReader::with_capacity(
            READ_BUFFER_SIZE,
            MultiBzDecoder::new(buffered),
        )))
    } else {
        Ok(Box::new(buffered))
    }
}

impl<R: BufRead> WikiReader<R> {
    pub fn from_reader(input: R) -> Self {
        Self {
            reader: Reader::from_reader(input),
            buf: Vec::new(),
            done: false,
        }
    }

    fn next_event<'b>(&mut self, buf: &'b mut Vec<u8>) -> Result<Event<'b>> {
        buf.clear();
        let pos = self.reader.buffer_position();
        self.reader
            .read_event_into(buf)
            .with_context(|| format!("Malformed XML near byte {}", pos))
    }

    fn next_item(&mut self) -> Result<Option<DumpItem>> {
        let mut buf = mem::take(&mut self.buf);
        let item = loop {
            let (name, empty) = match self.next_event(&mut buf)? {
                Event::Start(e) => (e.local_name().as_ref().to_vec(), false),
                Event::Empty(e) => (e.local_name().as_ref().to_vec(), true),
                Event::Eof => break None,
                _ => continue,
            };

            match (name.as_slice(), empty) {
                (b"mediawiki", _) => continue,
                (b"siteinfo", false) => break Some(DumpItem::SiteInfo(self.read_siteinfo()?)),
                (b"page", false) => break Some(DumpItem::Page(self.read_page()?)),
                (b"siteinfo", true) => break Some(DumpItem::SiteInfo(SiteInfo::default())),
                (b"page", true) => break Some(DumpItem::Page(WikiPage::default())),
                (other, _) => bail!(
                    "unhandled toplevel element: {:?}",
                    String::from_utf8_lossy(other)
                ),
            }
        };
        self.buf = buf;
        Ok(item)
    }

    fn read_siteinfo(&mut self) -> Result<SiteInfo> {
        let mut info = SiteInfo::default();
        let mut open: Vec<Vec<u8>> = Vec::new();
        let mut pending: Option<Namespace> = None;
        let mut text = String::new();
        let mut buf = Vec::new();

        loop {
            match self.next_event(&mut buf)? {
                Event::Start(e) => {
                    if e.local_name().as_ref() == b"namespace" {
                        pending = Some(namespace_decl(&e)?);
                    }
                    open.push(e.local_name().as_ref().to_vec());
                    text.clear();
                }
                Event::Empty(e) => {
                    if e.local_name().as_ref() == b"namespace" {
                        info.namespaces.push(namespace_decl(&e)?);
                    }
                }
                Event::Text(e) => text.push_str(&e.unescape()?),
                Event::CData(e) => text.push_str(std::str::from_utf8(&e)?),
                Event::End(_) => {
                    let Some(name) = open.pop() else {
                        return Ok(info);
                    };
                    match name.as_slice() {
                        b"sitename" => info.sitename = mem::take(&mut text),
                        b"dbname" => info.dbname = mem::take(&mut text),
                        b"base" => info.base = mem::take(&mut text),
                        b"generator" => info.generator = mem::take(&mut text),
                        b"namespace" => {
                            if let Some(mut ns) = pending.take() {
                                ns.name = mem::take(&mut text);
                                info.namespaces.push(ns);
                            }
                        }
                        _ => {}
                    }
                    text.clear();
                }
                Event::Eof => bail!("Unexpected end of dump inside <siteinfo>"),
                _ => {}
            }
        }
    }

    fn read_page(&mut self) -> Result<WikiPage> {
        let mut page = WikiPage::default();
        let mut open: Vec<Vec<u8>> = Vec::new();
        let mut text = String::new();
        let mut buf = Vec::new();

        loop {
            match self.next_event(&mut buf)? {
                Event::Start(e) => {
                    if open.is_empty() && e.local_name().as_ref() == b"redirect" {
                        page.redirect = redirect_target(&e)?;
                    }
                    open.push(e.local_name().as_ref().to_vec());
                    text.clear();
                }
                Event::Empty(e) => {
                    if open.is_empty() && e.local_name().as_ref() == b"redirect" {
                        page.redirect = redirect_target(&e)?;
                    }
                }
                Event::Text(e) => text.push_str(&e.unescape()?),
                Event::CData(e) => text.push_str(std::str::from_utf8(&e)?),
                Event::End(_) => {
                    let Some(name) = open.pop() else {
                        return Ok(page);
                    };
                    let parent = open.last().map(Vec::as_slice);
                    match (parent, name.as_slice()) {
                        (None, b"title") => page.title = mem::take(&mut text),
                        (None, b"ns") => page.ns = Some(parse_field(&text, "ns")?),
                        (None, b"id") => page.id = Some(parse_field(&text, "id")?),
                        // Later revisions replace earlier ones.
                        (Some(b"revision"), b"timestamp") => {
                            page.timestamp = Some(mem::take(&mut text))
                        }
                        (Some(b"revision"), b"text") => page.text = mem::take(&mut text),
                        _ => {}
                    }
                    text.clear();
                }
                Event::Eof => bail!("Unexpected end of dump inside <page>"),
                _ => {}
            }
        }
    }
}

impl<R: BufRead> Iterator for WikiReader<R> {
    type Item = Result<DumpItem>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_item() {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

fn parse_field<T>(text: &str, element: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    text.trim()
        .parse()
        .with_context(|| format!("Invalid <{}> value: {:?}", element, text))
}

fn namespace_decl(e: &BytesStart<'_>) -> Result<Namespace> {
    let mut ns = Namespace::new("", CaseRule::from(""));
    for attr in e.attributes() {
        let attr = attr?;
        let value = attr.unescape_value()?;
        match attr.key.local_name().as_ref() {
            b"key" => ns.key = Some(parse_field(&value, "namespace key")?),
            b"case" => ns.case_rule = CaseRule::from(&*value),
            _ => {}
        }
    }
    Ok(ns)
}

fn redirect_target(e: &BytesStart<'_>) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == b"title" {
            let title = attr.unescape_value()?;
            return Ok((!title.is_empty()).then(|| title.into_owned()));
        }
    }
    Ok(None)
}
