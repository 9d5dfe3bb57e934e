use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

fn key_line(key: &'static str, pad: usize, action: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(key, Style::default().fg(Color::Magenta)),
        Span::raw(" ".repeat(pad)),
        Span::raw(action),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let p = Paragraph::new(vec![
        Line::from("Keybinds:"),
        Line::from(vec![
            Span::raw("  "),
            Span::styled("q", Style::default().fg(Color::Magenta)),
            Span::raw(" / "),
            Span::styled("Ctrl-C", Style::default().fg(Color::Magenta)),
            Span::raw("  Quit"),
        ]),
        key_line("s", 11, "Start crawl"),
        key_line("x", 11, "Stop crawl"),
        key_line("r", 11, "Refresh status now"),
        key_line("1", 11, "Show/collapse registered sites"),
        key_line("2", 11, "Show/collapse current terms"),
        key_line("tab", 9, "Switch tabs"),
        key_line("?", 11, "Show this help"),
        Line::from(""),
        Line::from("Configuration:"),
        key_line("i", 11, "Import sites list from a file"),
        key_line("I", 11, "Import terms list from a file"),
        key_line("a", 11, "Add one site URL"),
        key_line("A", 11, "Add one search term"),
        key_line("e", 11, "Export sites list"),
        key_line("E", 11, "Export terms list"),
        key_line("y", 11, "Copy exported path to clipboard"),
        Line::from(""),
        Line::from("Import / add prompt:"),
        key_line("Enter", 7, "Upload the file or add the entry"),
        key_line("Esc", 9, "Cancel"),
    ])
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, area);
}
