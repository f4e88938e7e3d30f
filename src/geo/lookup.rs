use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use serde::Deserialize;
use thiserror::Error;

use crate::geo::country::names_match;
use crate::geo::http::{self, FetchError};

const LOOKUP_BASE: &str = "https://restcountries.com/v3.1/name/";
const FLAG_BASE: &str = "https://flagsapi.com/";

#[derive(Debug, Error)]
pub enum LookupError {
    #[error(transparent)]
    Network(#[from] FetchError),
    #[error("no metadata found for {0}")]
    NotFound(String),
    #[error("could not parse metadata reply: {0}")]
    Parse(#[from] serde_json::Error),
}

/// What the remote lookup adds on top of the local enrichment record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CountryMetadata {
    pub code: String,
    pub capital: Option<String>,
}

impl CountryMetadata {
    pub fn flag_url(&self) -> String {
        format!("{FLAG_BASE}{}/flat/64.png", self.code)
    }

    pub fn flag_emoji(&self) -> Option<String> {
        flag_emoji(&self.code)
    }
}

/// Regional indicator pair for a two-letter ISO code.
pub fn flag_emoji(code: &str) -> Option<String> {
    let code = code.trim();
    if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    code.chars()
        .map(|c| char::from_u32(0x1F1E6 + (c.to_ascii_uppercase() as u32 - 'A' as u32)))
        .collect()
}

pub fn lookup_url(name: &str) -> String {
    let mut url = String::from(LOOKUP_BASE);
    for byte in name.trim().bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
            url.push(byte as char);
        } else {
            url.push_str(&format!("%{byte:02X}"));
        }
    }
    url
}

#[derive(Deserialize)]
struct RestCountry {
    #[serde(default)]
    name: Option<RestName>,
    cca2: String,
    #[serde(default)]
    capital: Vec<String>,
}

#[derive(Deserialize)]
struct RestName {
    common: String,
}

/// Picks the entry whose common name matches, falling back to the first one.
pub fn parse_reply(name: &str, body: &str) -> Result<CountryMetadata, LookupError> {
    let entries: Vec<RestCountry> = serde_json::from_str(body)?;
    let position = entries
        .iter()
        .position(|e| e.name.as_ref().is_some_and(|n| names_match(&n.common, name)))
        .unwrap_or(0);
    let entry = entries
        .into_iter()
        .nth(position)
        .ok_or_else(|| LookupError::NotFound(name.to_string()))?;
    Ok(CountryMetadata {
        code: entry.cca2.to_ascii_uppercase(),
        capital: entry.capital.into_iter().next(),
    })
}

pub fn lookup(name: &str) -> Result<CountryMetadata, LookupError> {
    let body = http::fetch_url(&lookup_url(name))?;
    parse_reply(name, &body)
}

pub struct LookupReply {
    pub country: String,
    pub result: Result<CountryMetadata, LookupError>,
}

/// Runs lookups on short-lived threads and collects their replies.
pub struct MetadataLookup {
    tx: Sender<LookupReply>,
    rx: Receiver<LookupReply>,
}

impl Default for MetadataLookup {
    fn default() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }
}

impl MetadataLookup {
    pub fn request(&self, country: &str) {
        let tx = self.tx.clone();
        let country = country.to_string();
        thread::spawn(move || {
            let result = lookup(&country);
            let _ = tx.send(LookupReply { country, result });
        });
    }

    pub fn try_next(&self) -> Option<LookupReply> {
        self.rx.try_recv().ok()
    }
}
