use ratatui::text::Span;
use unicode_width::UnicodeWidthChar;
use unicode_width::UnicodeWidthStr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WrapMode {
    /// Break only at embedded `'\n'`.
    None,
    #[default]
    Word,
}

/// Lays styled spans out into lines no wider than `width` columns.
///
/// Embedded `'\n'` always starts a new line. In [`WrapMode::Word`] lines break at whitespace;
/// words longer than the width are split, preferring URL punctuation when the word looks like a
/// URL. Each returned line has adjacent spans of equal style coalesced. The result always holds
/// at least one (possibly empty) line.
pub fn wrap_spans(spans: &[Span<'static>], width: usize, mode: WrapMode) -> Vec<Vec<Span<'static>>> {
    let mut out = Vec::new();
    for line in split_hard_lines(spans) {
        match mode {
            WrapMode::None => out.push(coalesce(line)),
            WrapMode::Word => out.extend(word_wrap(line, width)),
        }
    }
    out
}

/// Display width of `spans` in terminal cells, with tabs counted as four columns.
pub fn spans_width(spans: &[Span<'_>]) -> usize {
    spans
        .iter()
        .flat_map(|s| s.content.chars())
        .map(|ch| match ch {
            '\t' => 4,
            ch => UnicodeWidthChar::width(ch).unwrap_or(0),
        })
        .sum()
}

fn split_hard_lines(spans: &[Span<'static>]) -> Vec<Vec<Span<'static>>> {
    let mut lines: Vec<Vec<Span<'static>>> = vec![Vec::new()];
    for span in spans {
        let mut parts = span.content.split('\n');
        if let Some(first) = parts.next()
            && !first.is_empty()
            && let Some(line) = lines.last_mut()
        {
            line.push(Span::styled(expand_tabs(first), span.style));
        }
        for part in parts {
            let mut line = Vec::new();
            if !part.is_empty() {
                line.push(Span::styled(expand_tabs(part), span.style));
            }
            lines.push(line);
        }
    }
    lines
}

fn word_wrap(line: Vec<Span<'static>>, width: usize) -> Vec<Vec<Span<'static>>> {
    if width == 0 {
        return vec![coalesce(line)];
    }

    let mut tokens: Vec<Span<'static>> = Vec::new();
    for span in &line {
        tokens.extend(split_span_ws(span));
    }

    let mut out: Vec<Vec<Span<'static>>> = Vec::new();
    let mut cur: Vec<Span<'static>> = Vec::new();
    let mut cur_cols = 0usize;

    for tok in tokens {
        let tok_cols = UnicodeWidthStr::width(tok.content.as_ref());
        if cur.is_empty() && is_all_ws(&tok.content) {
            continue;
        }
        if cur_cols + tok_cols <= width {
            cur.push(tok);
            cur_cols += tok_cols;
            continue;
        }

        if !cur.is_empty() {
            out.push(finish_line(&mut cur));
            cur_cols = 0;
        }
        if is_all_ws(&tok.content) {
            continue;
        }

        let mut remaining = tok;
        loop {
            let remaining_cols = UnicodeWidthStr::width(remaining.content.as_ref());
            if cur_cols + remaining_cols <= width {
                cur.push(remaining);
                cur_cols += remaining_cols;
                break;
            }
            let max = width.saturating_sub(cur_cols).max(1);
            let (head, tail) = split_to_width_prefer_url_breaks(&remaining, max);
            cur.push(head);
            out.push(finish_line(&mut cur));
            cur_cols = 0;
            if tail.content.is_empty() {
                break;
            }
            remaining = tail;
        }
    }

    if !cur.is_empty() || out.is_empty() {
        out.push(finish_line(&mut cur));
    }
    out
}

fn finish_line(cur: &mut Vec<Span<'static>>) -> Vec<Span<'static>> {
    while cur.last().is_some_and(|s| is_all_ws(&s.content)) {
        cur.pop();
    }
    coalesce(std::mem::take(cur))
}

fn coalesce(spans: Vec<Span<'static>>) -> Vec<Span<'static>> {
    let mut out: Vec<Span<'static>> = Vec::with_capacity(spans.len());
    for span in spans {
        if span.content.is_empty() {
            continue;
        }
        match out.last_mut() {
            Some(last) if last.style == span.style => {
                let mut text = last.content.to_string();
                text.push_str(&span.content);
                last.content = text.into();
            }
            _ => out.push(span),
        }
    }
    out
}

fn split_span_ws(span: &Span<'static>) -> Vec<Span<'static>> {
    let mut out = Vec::new();
    let mut buf = String::new();
    let mut last_was_ws: Option<bool> = None;
    for ch in span.content.chars() {
        let is_ws = ch.is_whitespace();
        match last_was_ws {
            Some(prev) if prev != is_ws => {
                out.push(Span::styled(std::mem::take(&mut buf), span.style));
            }
            _ => {}
        }
        buf.push(ch);
        last_was_ws = Some(is_ws);
    }
    if !buf.is_empty() {
        out.push(Span::styled(buf, span.style));
    }
    out
}

fn split_to_width_prefer_url_breaks(
    span: &Span<'static>,
    max_cols: usize,
) -> (Span<'static>, Span<'static>) {
    let text = span.content.as_ref();
    if looks_like_url(text)
        && let Some(idx) = last_url_breakpoint_before(text, max_cols)
    {
        let (a, b) = text.split_at(idx);
        return (
            Span::styled(a.to_string(), span.style),
            Span::styled(b.to_string(), span.style),
        );
    }
    split_to_width(span, max_cols)
}

fn split_to_width(span: &Span<'static>, max_cols: usize) -> (Span<'static>, Span<'static>) {
    let text = span.content.as_ref();
    let mut cols = 0usize;
    let mut idx = 0usize;
    for (byte_idx, ch) in text.char_indices() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if cols + w > max_cols {
            // A single glyph wider than the line still has to go somewhere.
            if idx == 0 {
                idx = byte_idx + ch.len_utf8();
            }
            break;
        }
        cols += w;
        idx = byte_idx + ch.len_utf8();
    }
    let (a, b) = text.split_at(idx);
    (
        Span::styled(a.to_string(), span.style),
        Span::styled(b.to_string(), span.style),
    )
}

fn looks_like_url(s: &str) -> bool {
    s.starts_with("https://") || s.starts_with("http://")
}

fn last_url_breakpoint_before(s: &str, max_cols: usize) -> Option<usize> {
    let mut cols = 0usize;
    let mut best = None;
    for (byte_idx, ch) in s.char_indices() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if cols + w > max_cols {
            break;
        }
        cols += w;
        if matches!(ch, '.' | '-' | '_' | '~' | '?' | '&' | '#' | '=' | '/') {
            best = Some(byte_idx + ch.len_utf8());
        }
    }
    best
}

fn is_all_ws(s: &str) -> bool {
    s.chars().all(char::is_whitespace)
}

fn expand_tabs(s: &str) -> String {
    if s.contains('\t') {
        s.replace('\t', "    ")
    } else {
        s.to_string()
    }
}
