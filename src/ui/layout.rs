use ratatui::layout::{Constraint, Direction, Layout, Rect};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutTier {
    Wide,   // ≥100 cols: globe + side panel
    Medium, // 60-99 cols: full-width globe, panel folded into header
    Narrow, // <60 cols: full-width globe, header only
}

impl LayoutTier {
    pub fn from_area(area: Rect) -> Self {
        if area.width >= 100 {
            LayoutTier::Wide
        } else if area.width >= 60 {
            LayoutTier::Medium
        } else {
            LayoutTier::Narrow
        }
    }

    pub fn show_sidebar(&self) -> bool {
        *self == LayoutTier::Wide
    }

    pub fn show_progress_bar(&self, height: u16) -> bool {
        height >= 20 && *self != LayoutTier::Narrow
    }
}

pub struct AppLayout {
    pub header: Rect,
    pub main: Rect,
    pub sidebar: Option<Rect>,
    pub footer: Rect,
    pub tier: LayoutTier,
}

impl AppLayout {
    pub fn new(area: Rect) -> Self {
        let tier = LayoutTier::from_area(area);

        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(10),
                Constraint::Length(1),
            ])
            .split(area);

        if tier.show_sidebar() {
            let horizontal = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(68), Constraint::Percentage(32)])
                .split(vertical[1]);

            Self {
                header: vertical[0],
                main: horizontal[0],
                sidebar: Some(horizontal[1]),
                footer: vertical[2],
                tier,
            }
        } else {
            Self {
                header: vertical[0],
                main: vertical[1],
                sidebar: None,
                footer: vertical[2],
                tier,
            }
        }
    }
}

/// Quiz and training screens: a bordered globe, an optional side or bottom
/// panel, and an optional progress gauge under the globe.
pub struct GlobeScreenLayout {
    pub header: Rect,
    pub globe: Rect,
    pub panel: Option<Rect>,
    pub progress: Option<Rect>,
    pub footer: Rect,
    pub tier: LayoutTier,
}

impl GlobeScreenLayout {
    pub fn new(area: Rect, with_progress: bool) -> Self {
        let base = AppLayout::new(area);
        let show_progress = with_progress && base.tier.show_progress_bar(area.height);

        let (mut globe, mut panel) = (base.main, base.sidebar);
        if panel.is_none() && base.main.height >= 24 {
            let split = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(12), Constraint::Length(10)])
                .split(base.main);
            globe = split[0];
            panel = Some(split[1]);
        }

        let mut progress = None;
        if show_progress {
            let split = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(8), Constraint::Length(3)])
                .split(globe);
            globe = split[0];
            progress = Some(split[1]);
        }

        Self {
            header: base.header,
            globe,
            panel,
            progress,
            footer: base.footer,
            tier: base.tier,
        }
    }

    /// Where the sphere is drawn, inside the globe's border.
    pub fn canvas(&self) -> Rect {
        crate::ui::components::globe::canvas_area(self.globe)
    }
}

/// The menu box on the main screen, below a 3-row header and above a 1-row footer.
pub fn menu_area(area: Rect) -> Rect {
    let base = AppLayout::new(area);
    let middle = Rect::new(
        area.x,
        base.header.y + base.header.height,
        area.width,
        base.footer.y.saturating_sub(base.header.y + base.header.height),
    );
    centered_rect(50, 80, middle)
}

pub fn pack_hint_lines(hints: &[&str], width: usize) -> Vec<String> {
    if width == 0 || hints.is_empty() {
        return Vec::new();
    }

    let prefix = " ";
    let separator = "  ";
    let mut out: Vec<String> = Vec::new();
    let mut current = prefix.to_string();
    let mut has_hint = false;

    for hint in hints.iter().filter(|h| !h.is_empty()) {
        let candidate = if has_hint {
            format!("{current}{separator}{hint}")
        } else {
            format!("{current}{hint}")
        };
        if candidate.chars().count() <= width {
            current = candidate;
        } else {
            if has_hint {
                out.push(current);
            }
            current = format!("{prefix}{hint}");
        }
        has_hint = true;
    }

    if has_hint {
        out.push(current);
    }
    out
}

pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    const MIN_POPUP_WIDTH: u16 = 60;
    const MIN_POPUP_HEIGHT: u16 = 18;

    let requested_w = area.width.saturating_mul(percent_x.min(100)) / 100;
    let requested_h = area.height.saturating_mul(percent_y.min(100)) / 100;

    let target_w = requested_w.max(MIN_POPUP_WIDTH).min(area.width);
    let target_h = requested_h.max(MIN_POPUP_HEIGHT).min(area.height);

    let left = area
        .x
        .saturating_add((area.width.saturating_sub(target_w)) / 2);
    let top = area
        .y
        .saturating_add((area.height.saturating_sub(target_h)) / 2);

    Rect::new(left, top, target_w, target_h)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiers_by_width() {
        assert_eq!(LayoutTier::from_area(Rect::new(0, 0, 120, 40)), LayoutTier::Wide);
        assert_eq!(LayoutTier::from_area(Rect::new(0, 0, 80, 40)), LayoutTier::Medium);
        assert_eq!(LayoutTier::from_area(Rect::new(0, 0, 40, 40)), LayoutTier::Narrow);
    }

    #[test]
    fn test_wide_layout_has_sidebar() {
        let layout = AppLayout::new(Rect::new(0, 0, 120, 40));
        let sidebar = layout.sidebar.unwrap();
        assert_eq!(layout.main.width + sidebar.width, 120);
        assert_eq!(layout.header.height, 3);
        assert!(AppLayout::new(Rect::new(0, 0, 80, 40)).sidebar.is_none());
    }

    #[test]
    fn test_globe_screen_layout_regions() {
        let wide = GlobeScreenLayout::new(Rect::new(0, 0, 120, 40), true);
        assert!(wide.panel.is_some());
        let progress = wide.progress.unwrap();
        assert_eq!(progress.y, wide.globe.y + wide.globe.height);
        assert_eq!(wide.canvas().width, wide.globe.width - 2);

        let medium_tall = GlobeScreenLayout::new(Rect::new(0, 0, 80, 40), false);
        let panel = medium_tall.panel.unwrap();
        assert_eq!(panel.height, 10);
        assert!(medium_tall.progress.is_none());

        let narrow = GlobeScreenLayout::new(Rect::new(0, 0, 50, 20), true);
        assert!(narrow.panel.is_none());
        assert!(narrow.progress.is_none());
    }

    #[test]
    fn test_menu_area_sits_between_header_and_footer() {
        let area = Rect::new(0, 0, 120, 40);
        let menu = menu_area(area);
        assert!(menu.y >= 3);
        assert!(menu.y + menu.height <= 39);
        assert_eq!(menu.width, 60);
    }

    #[test]
    fn test_pack_hint_lines_wraps() {
        let lines = pack_hint_lines(&["[a] One", "[b] Two", "[c] Three"], 18);
        assert_eq!(lines, vec![" [a] One  [b] Two", " [c] Three"]);
        assert!(pack_hint_lines(&[], 10).is_empty());
    }

    #[test]
    fn test_centered_rect_clamps_to_area() {
        let area = Rect::new(0, 0, 50, 10);
        assert_eq!(centered_rect(50, 50, area), area);
        let big = Rect::new(0, 0, 200, 100);
        let r = centered_rect(50, 50, big);
        assert_eq!((r.x, r.y, r.width, r.height), (50, 25, 100, 50));
    }
}
