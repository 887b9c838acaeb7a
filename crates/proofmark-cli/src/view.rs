use proofmark_engine::AnnotationKind;
use proofmark_engine::decorations::{DecorationSet, Segment};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

const CURSOR_GLYPH: &str = "▌";

/// Turn flat text plus decorations into styled terminal lines
pub fn styled_lines(text: &str, set: &DecorationSet) -> Vec<Line<'static>> {
    let widget_at = set.widget().map(|widget| widget.at);
    let mut lines: Vec<Vec<Span<'static>>> = vec![Vec::new()];

    for segment in set.segments(text.len()) {
        let style = segment_style(set, &segment);
        let mut start = segment.range.start;
        if let Some(at) = widget_at.filter(|at| segment.range.contains(at)) {
            push_text(&mut lines, &text[start..at], style);
            push_cursor(&mut lines);
            start = at;
        }
        push_text(&mut lines, &text[start..segment.range.end], style);
    }
    if widget_at == Some(text.len()) {
        push_cursor(&mut lines);
    }

    lines.into_iter().map(Line::from).collect()
}

/// Zero-based line and char column of a byte offset
pub fn line_col(text: &str, offset: usize) -> (usize, usize) {
    let before = &text[..offset.min(text.len())];
    let line = before.matches('\n').count();
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    (line, before[line_start..].chars().count())
}

/// Byte offset of a line and char column, clamped to the text
pub fn offset_at(text: &str, line: usize, col: usize) -> usize {
    let mut line_start = 0;
    for _ in 0..line {
        match text[line_start..].find('\n') {
            Some(i) => line_start += i + 1,
            None => return text.len(),
        }
    }
    let line_text = text[line_start..].split('\n').next().unwrap_or("");
    let within = line_text
        .char_indices()
        .nth(col)
        .map_or(line_text.len(), |(i, _)| i);
    line_start + within
}

/// Offset of the char before `offset`, if any
pub fn previous_boundary(text: &str, offset: usize) -> Option<usize> {
    text[..offset]
        .chars()
        .next_back()
        .map(|c| offset - c.len_utf8())
}

/// Offset just after the char at `offset`, if any
pub fn next_boundary(text: &str, offset: usize) -> Option<usize> {
    text[offset..].chars().next().map(|c| offset + c.len_utf8())
}

fn segment_style(set: &DecorationSet, segment: &Segment) -> Style {
    let innermost = segment
        .decorations
        .iter()
        .map(|&index| &set.inline()[index])
        .min_by_key(|decoration| decoration.range.len());
    match innermost.map(|decoration| decoration.kind) {
        Some(AnnotationKind::Spelling) => Style::default()
            .fg(Color::Red)
            .add_modifier(Modifier::UNDERLINED),
        Some(AnnotationKind::Grammar) => Style::default()
            .fg(Color::Blue)
            .add_modifier(Modifier::UNDERLINED),
        Some(AnnotationKind::AiCursor) | None => Style::default(),
    }
}

fn push_text(lines: &mut Vec<Vec<Span<'static>>>, text: &str, style: Style) {
    for (i, piece) in text.split('\n').enumerate() {
        if i > 0 {
            lines.push(Vec::new());
        }
        if !piece.is_empty()
            && let Some(line) = lines.last_mut()
        {
            line.push(Span::styled(piece.to_string(), style));
        }
    }
}

fn push_cursor(lines: &mut [Vec<Span<'static>>]) {
    if let Some(line) = lines.last_mut() {
        line.push(Span::styled(
            CURSOR_GLYPH,
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::SLOW_BLINK),
        ));
    }
}
