#![allow(dead_code)]

use regex::Regex;
use std::collections::HashMap;
use std::io::{Cursor, Read};

/// Open a DOCX archive and return `word/document.xml`.
pub fn document_xml(bytes: &[u8]) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("docx is a zip archive");
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .expect("document part present")
        .read_to_string(&mut xml)
        .expect("document part is utf-8");
    xml
}

/// Text runs in document order.
pub fn texts(xml: &str) -> Vec<String> {
    let re = Regex::new(r"<w:t(?:\s[^>]*)?>([^<]*)</w:t>").unwrap();
    re.captures_iter(xml).map(|c| c[1].to_string()).collect()
}

pub fn drawings(xml: &str) -> usize {
    xml.matches("<w:drawing").count()
}

pub fn page_breaks(xml: &str) -> usize {
    xml.matches("w:type=\"page\"").count()
}

/// All `cx="..."` picture extents in document order.
pub fn extents(xml: &str) -> Vec<(u64, u64)> {
    let re = Regex::new(r#"<wp:extent cx="(\d+)" cy="(\d+)""#).unwrap();
    re.captures_iter(xml)
        .map(|c| (c[1].parse().unwrap(), c[2].parse().unwrap()))
        .collect()
}

fn archive_part(bytes: &[u8], name: &str) -> Vec<u8> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("docx is a zip archive");
    let mut part = Vec::new();
    archive
        .by_name(name)
        .unwrap_or_else(|_| panic!("{name} present"))
        .read_to_end(&mut part)
        .expect("part readable");
    part
}

/// Embedded picture bytes, in the order the drawings appear in the body.
pub fn embedded_images(bytes: &[u8]) -> Vec<Vec<u8>> {
    let rels = String::from_utf8(archive_part(bytes, "word/_rels/document.xml.rels"))
        .expect("relationships are utf-8");
    let element = Regex::new(r"<Relationship\s[^>]*>").unwrap();
    let id = Regex::new(r#"\sId="([^"]+)""#).unwrap();
    let target = Regex::new(r#"\sTarget="([^"]+)""#).unwrap();
    let targets: HashMap<String, String> = element
        .find_iter(&rels)
        .filter_map(|m| {
            let tag = m.as_str();
            Some((id.captures(tag)?[1].to_string(), target.captures(tag)?[1].to_string()))
        })
        .collect();

    let embed = Regex::new(r#"r:embed="([^"]+)""#).unwrap();
    embed
        .captures_iter(&document_xml(bytes))
        .map(|c| {
            let target = &targets[&c[1]];
            let name = match target.strip_prefix('/') {
                Some(absolute) => absolute.to_string(),
                None => format!("word/{target}"),
            };
            archive_part(bytes, &name)
        })
        .collect()
}
