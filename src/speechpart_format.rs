// src/speechpart_format.rs
//
// Inline speech-part markup inside transcribed content. The editor tags
// speech-part spans as <speechpart id="..">...</speechpart> elements; the id
// attribute is optional and must round-trip exactly (absent stays absent).

use quick_xml::escape::{escape, unescape};
use quick_xml::events::Event;
use quick_xml::Reader;

/// Name of the inline format, also the element name in persisted content.
pub const FORMAT_NAME: &str = "speechpart";

/// One segment of transcribed content: plain text or a tagged speech-part
/// span carrying its optional record id.
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptionSpan {
    Text(String),
    Speechpart { id: Option<String>, text: String },
}

/// Split transcribed content into plain-text and speech-part spans.
/// Elements other than `speechpart` are not expected in this layer and are
/// passed through as their text content.
pub fn parse_spans(content: &str) -> Result<Vec<TranscriptionSpan>, String> {
    let mut reader = Reader::from_str(content);
    let mut spans = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.name().as_ref() == FORMAT_NAME.as_bytes() => {
                let id = span_id(e)?;
                let mut text = String::new();
                loop {
                    match reader.read_event() {
                        Ok(Event::Text(t)) => {
                            text.push_str(&t.unescape().unwrap_or_default());
                        }
                        Ok(Event::End(ref end))
                            if end.name().as_ref() == FORMAT_NAME.as_bytes() =>
                        {
                            break;
                        }
                        Ok(Event::Eof) => {
                            return Err("Unclosed speechpart element".to_string());
                        }
                        Err(e) => {
                            return Err(format!("Failed to parse transcription: {:?}", e));
                        }
                        _ => {}
                    }
                }
                spans.push(TranscriptionSpan::Speechpart { id, text });
            }
            Ok(Event::Empty(ref e)) if e.name().as_ref() == FORMAT_NAME.as_bytes() => {
                spans.push(TranscriptionSpan::Speechpart {
                    id: span_id(e)?,
                    text: String::new(),
                });
            }
            Ok(Event::Text(t)) => {
                let text = t.unescape().unwrap_or_default().to_string();
                if !text.is_empty() {
                    spans.push(TranscriptionSpan::Text(text));
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(format!("Failed to parse transcription: {:?}", e)),
        }
    }

    Ok(spans)
}

fn span_id(e: &quick_xml::events::BytesStart<'_>) -> Result<Option<String>, String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == b"id" {
            let value = unescape(&String::from_utf8_lossy(&attr.value))
                .map_err(|err| format!("Bad id attribute: {:?}", err))?
                .to_string();
            return Ok(Some(value));
        }
    }
    Ok(None)
}

/// Serialize spans back into persisted content, the inverse of
/// [`parse_spans`]. The id attribute is emitted only when present.
pub fn serialize_spans(spans: &[TranscriptionSpan]) -> String {
    let mut out = String::new();
    for span in spans {
        match span {
            TranscriptionSpan::Text(text) => out.push_str(&escape(text)),
            TranscriptionSpan::Speechpart { id, text } => {
                match id {
                    Some(id) => {
                        out.push_str(&format!("<{} id=\"{}\">", FORMAT_NAME, escape(id)))
                    }
                    None => out.push_str(&format!("<{}>", FORMAT_NAME)),
                }
                out.push_str(&escape(text));
                out.push_str(&format!("</{}>", FORMAT_NAME));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixed_content() {
        let content = "he said <speechpart id=\"12\">come here</speechpart> and left";
        let spans = parse_spans(content).unwrap();
        assert_eq!(
            spans,
            vec![
                TranscriptionSpan::Text("he said ".to_string()),
                TranscriptionSpan::Speechpart {
                    id: Some("12".to_string()),
                    text: "come here".to_string(),
                },
                TranscriptionSpan::Text(" and left".to_string()),
            ]
        );
    }

    #[test]
    fn test_round_trip_with_and_without_id() {
        let content = "a<speechpart id=\"3\">b</speechpart>c<speechpart>d</speechpart>";
        let spans = parse_spans(content).unwrap();
        assert_eq!(serialize_spans(&spans), content);
    }

    #[test]
    fn test_missing_id_stays_absent() {
        let spans = parse_spans("<speechpart>oratio</speechpart>").unwrap();
        assert_eq!(
            spans,
            vec![TranscriptionSpan::Speechpart {
                id: None,
                text: "oratio".to_string(),
            }]
        );
    }

    #[test]
    fn test_escaped_text_round_trip() {
        let spans = vec![
            TranscriptionSpan::Text("a < b ".to_string()),
            TranscriptionSpan::Speechpart {
                id: Some("1".to_string()),
                text: "\"quoted\" & more".to_string(),
            },
        ];
        let content = serialize_spans(&spans);
        assert_eq!(parse_spans(&content).unwrap(), spans);
    }

    #[test]
    fn test_unclosed_span_is_an_error() {
        assert!(parse_spans("<speechpart id=\"1\">oops").is_err());
    }
}
