//! Styled markup for the export pipeline.
//!
//! Each block becomes a sequence of `<span style="...">` elements followed by
//! `<br/>`. Every span declares its complete style, with explicit `normal` and
//! `none` values, so nothing depends on inherited styling.

use std::fmt::Write;

use super::{Block, Document, FontMetrics, FontMetricsTable, Run, TextStyle, color_to_hex, parse_hex_color};
use crate::error::MarkupError;

const LINE_BREAK: &str = "<br/>";
const SPAN_CLOSE: &str = "</span>";

/// Serialises `document`, biasing each run by its family's metrics
pub fn to_markup(document: &Document, metrics: &FontMetricsTable) -> String {
    let mut out = String::new();
    for block in document.blocks() {
        // Space folding applies per line, across span boundaries
        let mut previous_space = false;
        for run in block.runs() {
            let declaration = style_declaration(run.style(), metrics.get(&run.style().font_family));
            let _ = write!(out, "<span style=\"{}\">", escape_attribute(&declaration));
            escape_text(run.text(), &mut previous_space, &mut out);
            out.push_str(SPAN_CLOSE);
        }
        out.push_str(LINE_BREAK);
    }
    out
}

/// Inline style declaration for one run
pub fn style_declaration(style: &TextStyle, metrics: FontMetrics) -> String {
    format!(
        "font-family: '{}'; font-size: {}pt; position: relative; top: {}px; letter-spacing: {}px; \
         color: {}; font-weight: {}; font-style: {}; text-decoration: {}",
        quote_family(&style.font_family),
        metrics.font_size,
        metrics.vertical_offset,
        metrics.letter_spacing,
        color_to_hex(style.color),
        if style.bold { "bold" } else { "normal" },
        if style.italic { "italic" } else { "normal" },
        if style.underline { "underline" } else { "none" },
    )
}

fn quote_family(family: &str) -> String {
    family.replace('\\', "\\\\").replace('\'', "\\'")
}

fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

/// Escapes markup characters. A space directly after another space becomes
/// `&nbsp;` so a whitespace-folding renderer keeps the run of spaces.
fn escape_text(text: &str, previous_space: &mut bool, out: &mut String) {
    for c in text.chars() {
        match c {
            ' ' if *previous_space => out.push_str("&nbsp;"),
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&#160;"),
            c => out.push(c),
        }
        *previous_space = c == ' ';
    }
}

/// Resolves character references. `&nbsp;` maps back to a plain space, the
/// inverse of the space policy in [`to_markup`].
fn unescape(text: &str) -> Result<String, MarkupError> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp + 1..];
        let semi = tail
            .find(';')
            .ok_or_else(|| MarkupError::UnknownEntity(tail.chars().take(8).collect()))?;
        let name = &tail[..semi];
        let c = match name {
            "amp" => '&',
            "lt" => '<',
            "gt" => '>',
            "quot" => '"',
            "apos" => '\'',
            "nbsp" => ' ',
            _ => numeric_reference(name).ok_or_else(|| MarkupError::UnknownEntity(name.to_owned()))?,
        };
        out.push(c);
        rest = &tail[semi + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

fn numeric_reference(name: &str) -> Option<char> {
    let digits = name.strip_prefix('#')?;
    let code = match digits.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => digits.parse().ok()?,
    };
    char::from_u32(code)
}

fn line_break_len(rest: &str) -> Option<usize> {
    ["<br/>", "<br />", "<br>"]
        .iter()
        .find(|tag| rest.starts_with(*tag))
        .map(|tag| tag.len())
}

/// Parses markup produced by [`to_markup`] back into a document. Metric
/// properties are ignored; they are derived from the font family.
pub fn parse_markup(markup: &str) -> Result<Document, MarkupError> {
    let mut blocks = Vec::new();
    let mut current = Block::new();
    let mut open_block = false;
    let mut pos = 0;

    while pos < markup.len() {
        let rest = &markup[pos..];
        // Each break closes the current block
        if let Some(len) = line_break_len(rest) {
            blocks.push(std::mem::take(&mut current));
            open_block = false;
            pos += len;
        } else if is_span_open(rest) {
            let (run, len) = parse_span(markup, pos)?;
            current.push_run(run);
            open_block = true;
            pos += len;
        } else if rest.starts_with('<') {
            // Unknown elements are rejected, never dropped
            return Err(MarkupError::UnsupportedElement(pos));
        } else {
            return Err(MarkupError::TextOutsideSpan(pos));
        }
    }

    // A trailing line break terminates the last block rather than opening one
    if open_block || blocks.is_empty() {
        blocks.push(current);
    }
    Ok(Document::from_blocks(blocks))
}

fn is_span_open(rest: &str) -> bool {
    rest.strip_prefix("<span")
        .and_then(|after| after.chars().next())
        .is_some_and(|c| c == '>' || c.is_whitespace())
}

/// Parses the span at byte `start`, returning the run and the consumed length
fn parse_span(markup: &str, start: usize) -> Result<(Run, usize), MarkupError> {
    let rest = &markup[start..];
    let tag_end = rest.find('>').ok_or(MarkupError::Unterminated(start))?;
    let tag = &rest[..tag_end];
    let raw_style = attribute(tag, "style").ok_or(MarkupError::MissingStyle(start))?;
    let style = parse_style(&unescape(raw_style)?)?;

    // Body runs to the first closing tag and may not nest
    let body_start = tag_end + 1;
    let body_len = rest[body_start..]
        .find(SPAN_CLOSE)
        .ok_or(MarkupError::Unterminated(start))?;
    let body = &rest[body_start..body_start + body_len];
    if let Some(nested) = body.find('<') {
        return Err(MarkupError::UnsupportedElement(start + body_start + nested));
    }

    let run = Run::new(unescape(body)?, style);
    Ok((run, body_start + body_len + SPAN_CLOSE.len()))
}

/// Raw value of a double-quoted attribute
fn attribute<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let marker = format!(" {name}=\"");
    let value_start = tag.find(&marker)? + marker.len();
    let value_len = tag[value_start..].find('"')?;
    Some(&tag[value_start..value_start + value_len])
}

fn parse_style(declaration: &str) -> Result<TextStyle, MarkupError> {
    let mut font_family = None;
    let mut color = None;
    let mut style = TextStyle::default();

    for (property, value) in parse_declarations(declaration)? {
        match property.as_str() {
            "font-family" => font_family = Some(value),
            "color" => color = Some(parse_hex_color(&value)?),
            "font-weight" => {
                style.bold = value == "bold" || value == "bolder" || value.parse::<u16>().is_ok_and(|w| w >= 600)
            }
            "font-style" => style.italic = value == "italic" || value == "oblique",
            "text-decoration" => style.underline = value.split_whitespace().any(|v| v == "underline"),
            _ => {}
        }
    }

    // Family and colour are required, the rest default
    style.font_family = font_family.ok_or(MarkupError::MissingProperty("font-family"))?;
    style.color = color.ok_or(MarkupError::MissingProperty("color"))?;
    Ok(style)
}

/// Splits `name: value; ...`. Quoted values run to the matching quote and
/// may contain `;`.
fn parse_declarations(declaration: &str) -> Result<Vec<(String, String)>, MarkupError> {
    let mut declarations = Vec::new();
    let mut rest = declaration;
    loop {
        rest = rest.trim_start_matches(|c: char| c == ';' || c.is_whitespace());
        if rest.is_empty() {
            break;
        }
        let (name, after) = rest
            .split_once(':')
            .ok_or_else(|| MarkupError::BadDeclaration(rest.to_owned()))?;
        let after = after.trim_start();
        let (value, remainder) = match after.chars().next() {
            Some(quote @ ('\'' | '"')) => {
                split_quoted(&after[1..], quote).ok_or_else(|| MarkupError::BadDeclaration(after.to_owned()))?
            }
            _ => match after.split_once(';') {
                Some((value, remainder)) => (value.trim().to_owned(), remainder),
                None => (after.trim().to_owned(), ""),
            },
        };
        declarations.push((name.trim().to_ascii_lowercase(), value));
        rest = remainder;
    }
    Ok(declarations)
}

fn split_quoted(body: &str, quote: char) -> Option<(String, &str)> {
    let mut value = String::new();
    let mut chars = body.char_indices();
    while let Some((index, c)) = chars.next() {
        match c {
            '\\' => value.push(chars.next()?.1),
            c if c == quote => return Some((value, &body[index + 1..])),
            c => value.push(c),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::Color32;

    fn doc_of(runs: Vec<Run>) -> Document {
        Document::from_blocks([Block::from_runs(runs)])
    }

    #[test]
    fn test_span_declares_every_attribute() {
        let doc = doc_of(vec![Run::new("hi", TextStyle::default())]);
        let markup = to_markup(&doc, &FontMetricsTable::default());
        assert!(markup.contains("font-weight: normal"));
        assert!(markup.contains("font-style: normal"));
        assert!(markup.contains("text-decoration: none"));
        assert!(markup.contains("color: #000f55"));
        assert!(markup.contains("font-family: 'Homemade Apple'"));
        assert!(markup.ends_with("hi</span><br/>"));
    }

    #[test]
    fn test_repeated_spaces_become_nbsp() {
        let doc = doc_of(vec![Run::new("a   b", TextStyle::default())]);
        let markup = to_markup(&doc, &FontMetricsTable::default());
        assert!(markup.contains(">a &nbsp;&nbsp;b<"));
        assert_eq!(parse_markup(&markup).unwrap(), doc);
    }

    #[test]
    fn test_space_run_continues_across_spans() {
        let red = TextStyle {
            color: Color32::RED,
            ..TextStyle::default()
        };
        let doc = doc_of(vec![Run::new("a ", TextStyle::default()), Run::new(" b", red)]);
        let markup = to_markup(&doc, &FontMetricsTable::default());
        assert!(markup.contains(">&nbsp;b<"));
    }

    #[test]
    fn test_escaping_round_trips() {
        let style = TextStyle {
            font_family: "O'Brien \"Script\" & Co".to_owned(),
            bold: true,
            underline: true,
            ..TextStyle::default()
        };
        let doc = doc_of(vec![Run::new("1 < 2 && 3 > 2\u{a0}ok", style)]);
        let markup = to_markup(&doc, &FontMetricsTable::default());
        assert_eq!(parse_markup(&markup).unwrap(), doc);
    }

    #[test]
    fn test_empty_blocks_survive() {
        let doc = Document::from_blocks([
            Block::from_runs([Run::new("x", TextStyle::default())]),
            Block::new(),
            Block::new(),
        ]);
        let markup = to_markup(&doc, &FontMetricsTable::default());
        assert_eq!(parse_markup(&markup).unwrap().block_count(), 3);
        assert_eq!(parse_markup("").unwrap(), Document::new());
    }

    #[test]
    fn test_malformed_markup() {
        assert_eq!(parse_markup("hello"), Err(MarkupError::TextOutsideSpan(0)));
        assert_eq!(parse_markup("<b>x</b>"), Err(MarkupError::UnsupportedElement(0)));
        assert_eq!(parse_markup("<span>x</span>"), Err(MarkupError::MissingStyle(0)));
        assert_eq!(
            parse_markup("<span style=\"font-family: 'A'\">x</span>"),
            Err(MarkupError::MissingProperty("color"))
        );
        assert_eq!(
            parse_markup("<span style=\"font-family: 'A'; color: #000000\">x"),
            Err(MarkupError::Unterminated(0))
        );
        assert_eq!(
            parse_markup("<span style=\"font-family: 'A'; color: #000000\">&bogus;</span>"),
            Err(MarkupError::UnknownEntity("bogus".to_owned()))
        );
    }
}
