//! Status widgets
//!
//! The host draws two widgets: the primary one (project name and icon) and a
//! secondary one for the branch. [`StatusBar`] applies engine effects to them;
//! [`ItemState`] is the in-memory widget the terminal host renders from.

use colored::Colorize;
use serde::Serialize;

use crate::config::{Alignment, Settings};
use crate::engine::{Effect, WidgetContent};

/// Where a widget sits in the status area.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub alignment: Alignment,
    pub priority: i64,
}

impl Placement {
    pub fn primary(settings: &Settings) -> Self {
        Self {
            alignment: settings.align,
            priority: settings.align_priority,
        }
    }

    /// The branch widget sits right after the primary one.
    pub fn branch(settings: &Settings) -> Self {
        Self {
            alignment: settings.align,
            priority: settings.align_priority.saturating_sub(1),
        }
    }
}

/// Status widget primitive provided by the host.
pub trait StatusItem {
    fn set_text(&mut self, text: &str);
    fn set_color(&mut self, color: Option<&str>);
    fn set_command(&mut self, command: Option<&str>);
    fn set_placement(&mut self, placement: Placement);
    fn show(&mut self);
    fn hide(&mut self);
}

/// Widget that just remembers what it was told.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ItemState {
    pub text: String,
    pub color: Option<String>,
    pub command: Option<String>,
    pub visible: bool,
    pub placement: Placement,
}

impl StatusItem for ItemState {
    fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
    }

    fn set_color(&mut self, color: Option<&str>) {
        self.color = color.map(str::to_string);
    }

    fn set_command(&mut self, command: Option<&str>) {
        self.command = command.map(str::to_string);
    }

    fn set_placement(&mut self, placement: Placement) {
        self.placement = placement;
    }

    fn show(&mut self) {
        self.visible = true;
    }

    fn hide(&mut self) {
        self.visible = false;
    }
}

/// The primary and branch widgets.
#[derive(Debug, Clone, Default)]
pub struct StatusBar<I: StatusItem = ItemState> {
    primary: I,
    branch: I,
}

impl<I: StatusItem> StatusBar<I> {
    pub fn new(primary: I, branch: I) -> Self {
        Self { primary, branch }
    }

    pub fn primary(&self) -> &I {
        &self.primary
    }

    pub fn branch(&self) -> &I {
        &self.branch
    }

    pub fn place(&mut self, settings: &Settings) {
        self.primary.set_placement(Placement::primary(settings));
        self.branch.set_placement(Placement::branch(settings));
    }

    /// Apply the widget effects of a transition; other effects are ignored.
    pub fn apply(&mut self, effects: &[Effect]) {
        for effect in effects {
            match effect {
                Effect::HidePrimary => {
                    self.primary.set_text("");
                    self.primary.hide();
                }
                Effect::RenderPrimary(content) => {
                    write_content(&mut self.primary, content);
                    self.primary.show();
                }
                Effect::ShowBranch(content) => {
                    write_content(&mut self.branch, content);
                    self.branch.show();
                }
                Effect::HideBranch => self.branch.hide(),
                Effect::RearmWatcher { .. } | Effect::LogBranchChange { .. } => {}
            }
        }
    }
}

fn write_content<I: StatusItem>(item: &mut I, content: &WidgetContent) {
    item.set_text(&content.text);
    item.set_color(content.color.as_deref());
    item.set_command(content.command.as_deref());
}

/// How the terminal host prints the status line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineFormat {
    #[default]
    Plain,
    Json,
}

#[derive(Serialize)]
struct JsonLine<'a> {
    primary: &'a ItemState,
    branch: &'a ItemState,
}

/// Render the two widgets as one line of terminal output.
pub fn render_line(bar: &StatusBar<ItemState>, format: LineFormat, width: Option<usize>) -> String {
    match format {
        LineFormat::Json => serde_json::to_string(&JsonLine {
            primary: bar.primary(),
            branch: bar.branch(),
        })
        .unwrap_or_default(),
        LineFormat::Plain => render_plain(bar, width),
    }
}

fn render_plain(bar: &StatusBar<ItemState>, width: Option<usize>) -> String {
    let mut items = [bar.primary(), bar.branch()];
    // Higher priority sits further left on either side.
    items.sort_by_key(|item| std::cmp::Reverse(item.placement.priority));

    let mut plain_len = 0;
    let mut line = String::new();
    for item in items.iter().filter(|item| item.visible && !item.text.is_empty()) {
        plain_len += item.text.chars().count();
        line.push_str(&paint(&item.text, item.color.as_deref()));
    }

    match (bar.primary().placement.alignment, width) {
        (Alignment::Right, Some(width)) if width > plain_len => {
            format!("{}{}", " ".repeat(width - plain_len), line)
        }
        _ => line,
    }
}

fn paint(text: &str, color: Option<&str>) -> String {
    match color.and_then(parse_hex) {
        Some((r, g, b)) => text.truecolor(r, g, b).to_string(),
        None => text.to_string(),
    }
}

/// Parse `#rrggbb` or `#rgb`.
pub fn parse_hex(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        6 => Some((channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?)),
        3 => {
            let double = |i: usize| channel(&hex[i..i + 1]).map(|v| v * 17);
            Some((double(0)?, double(1)?, double(2)?))
        }
        _ => None,
    }
}
