//! Frame geometry. Everything here is a pure function of the terminal size.

use ratatui::layout::Rect;

pub const MIN_WIDTH: u16 = 40;
pub const MIN_HEIGHT: u16 = 10;

const HEADER_BOX_HEIGHT: u16 = 3;
const INFO_HEIGHT: u16 = 1;
const SEPARATOR_HEIGHT: u16 = 1;
const FOOTER_HEIGHT: u16 = 1;
const PREVIEW_MIN: u16 = 6;
const PREVIEW_MAX: u16 = 14;

pub const INDICATOR_COLS: usize = 3;
pub const PIN_COLS: usize = 2;
pub const TIMESTAMP_COLS: usize = 18;
pub const AGE_COLS: usize = 9;
const PROJECT_MIN: usize = 12;
const PROJECT_MAX: usize = 28;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameLayout {
    pub header: Rect,
    pub info: Rect,
    pub list: Rect,
    pub separator: Rect,
    pub preview: Rect,
    pub footer: Rect,
}

/// Splits `area` into the browser's regions, or `None` when the terminal is
/// below the minimum size and only the warning may be drawn.
pub fn compute(area: Rect) -> Option<FrameLayout> {
    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        return None;
    }

    let fixed = HEADER_BOX_HEIGHT + INFO_HEIGHT + SEPARATOR_HEIGHT + FOOTER_HEIGHT;
    let remaining = area.height - fixed;
    let preview_h = preview_height(remaining);
    let list_h = remaining - preview_h;

    let row = |y: u16, height: u16| Rect::new(area.x, y, area.width, height);
    let header = row(area.y, HEADER_BOX_HEIGHT);
    let info = row(header.bottom(), INFO_HEIGHT);
    let list = row(info.bottom(), list_h);
    let separator = row(list.bottom(), SEPARATOR_HEIGHT);
    let preview = row(separator.bottom(), preview_h);
    let footer = row(preview.bottom(), FOOTER_HEIGHT);

    Some(FrameLayout {
        header,
        info,
        list,
        separator,
        preview,
        footer,
    })
}

/// Two fifths of the free rows, clamped, but never starving the list.
pub fn preview_height(remaining: u16) -> u16 {
    let share = (u32::from(remaining) * 2 / 5).min(u32::from(PREVIEW_MAX)) as u16;
    share
        .clamp(PREVIEW_MIN, PREVIEW_MAX)
        .min(remaining.saturating_sub(1))
}

/// Column widths for one list row, in display cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowColumns {
    pub tag: usize,
    pub project: usize,
    pub description: usize,
}

/// Fixed columns are reserved first, then the project path, then whatever is
/// left goes to the description.
pub fn row_columns(width: usize, widest_tag: usize) -> RowColumns {
    let tag = widest_tag.min(width / 4);
    let fixed = INDICATOR_COLS + PIN_COLS + tag + TIMESTAMP_COLS + AGE_COLS;
    let free = width.saturating_sub(fixed);
    let project = (free / 3).clamp(PROJECT_MIN, PROJECT_MAX).min(free);
    let description = free.saturating_sub(project + 1);
    RowColumns {
        tag,
        project,
        description,
    }
}

pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

pub fn help_rect(area: Rect, lines: usize) -> Rect {
    let width = 56.min(area.width.saturating_sub(4));
    let height = (lines as u16 + 2).min(area.height.saturating_sub(2));
    centered(area, width, height)
}

/// Wide enough for the longest line plus padding, at least 40 columns.
pub fn confirm_rect(area: Rect, longest_line: usize, lines: usize) -> Rect {
    let wanted = (longest_line as u16).saturating_add(6).max(40);
    let width = wanted.min(area.width.saturating_sub(4));
    let height = (lines as u16 + 2).min(area.height);
    centered(area, width, height)
}

pub fn launch_rect(area: Rect, lines: usize) -> Rect {
    let width = 64.min(area.width.saturating_sub(4));
    let height = (lines as u16 + 2).min(area.height.saturating_sub(2));
    centered(area, width, height)
}
