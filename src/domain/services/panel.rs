#[cfg(test)]
#[path = "panel_test.rs"]
mod tests;

use unicode_width::UnicodeWidthStr;
use yansi::Color;
use yansi::Paint;

const PADDING_X: usize = 2;
const PADDING_Y: usize = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanelKind {
    Info,
    Error,
}

/// A rounded box drawn around status messages, used for everything that
/// isn't part of the conversation itself.
pub struct Panel {
    title: Option<String>,
    lines: Vec<String>,
    kind: PanelKind,
}

impl Panel {
    pub fn info(lines: Vec<String>) -> Panel {
        return Panel {
            title: None,
            lines,
            kind: PanelKind::Info,
        };
    }

    pub fn error(title: &str, lines: Vec<String>) -> Panel {
        return Panel {
            title: Some(title.to_string()),
            lines,
            kind: PanelKind::Error,
        };
    }

    pub fn with_title(mut self, title: &str) -> Panel {
        self.title = Some(title.to_string());
        return self;
    }

    pub fn render(&self) -> String {
        return self.render_with(Paint::is_enabled());
    }

    fn rows(&self) -> Vec<(String, bool)> {
        let mut rows = vec![];
        if let Some(title) = &self.title {
            rows.push((title.replace('\t', "  "), true));
        }
        for line in self.lines.iter() {
            for part in line.split('\n') {
                rows.push((part.replace('\t', "  "), false));
            }
        }

        return rows;
    }

    fn paint_border(&self, text: String, colored: bool) -> String {
        if !colored {
            return text;
        }

        match self.kind {
            PanelKind::Info => return Paint::new(text).fg(Color::Fixed(8)).to_string(),
            PanelKind::Error => return Paint::red(text).to_string(),
        }
    }

    fn paint_row(&self, text: &str, is_title: bool, colored: bool) -> String {
        if !colored {
            return text.to_string();
        }

        match (self.kind, is_title) {
            (PanelKind::Info, true) => return Paint::new(text).bold().to_string(),
            (PanelKind::Info, false) => return text.to_string(),
            (PanelKind::Error, true) => return Paint::red(text).bold().to_string(),
            (PanelKind::Error, false) => return Paint::red(text).to_string(),
        }
    }

    fn render_with(&self, colored: bool) -> String {
        let rows = self.rows();
        let max_width = rows
            .iter()
            .map(|(text, _)| return text.width())
            .max()
            .unwrap_or(0);
        let inner_width = max_width + PADDING_X * 2;

        let inner_bar = "─".repeat(inner_width);
        let side = self.paint_border("│".to_string(), colored);
        let padding = " ".repeat(PADDING_X);
        let empty_row = format!("{side}{}{side}", " ".repeat(inner_width));

        let mut lines = vec![self.paint_border(format!("╭{inner_bar}╮"), colored)];
        lines.extend(vec![empty_row.to_string(); PADDING_Y]);

        for (text, is_title) in rows.iter() {
            let fill = " ".repeat(max_width - text.width());
            lines.push(format!(
                "{side}{padding}{}{fill}{padding}{side}",
                self.paint_row(text, *is_title, colored)
            ));
        }

        lines.extend(vec![empty_row; PADDING_Y]);
        lines.push(self.paint_border(format!("╰{inner_bar}╯"), colored));

        return lines.join("\n");
    }
}
