//! Document paging with last-request-wins page renders
//!
//! Page rasterization happens outside this crate and may finish after the
//! user has already moved on. Every page request bumps a generation counter
//! and hands out a [`RenderTicket`]; a finished render is only applied if its
//! ticket still matches the current generation.

use tracing::debug;

/// Identifies one requested page render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct RenderTicket {
    /// 1-based page that was requested
    pub page: u32,
    pub generation: u64,
}

/// Rendered content dimensions in document pixels
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ContentSize {
    pub width: f64,
    pub height: f64,
}

impl ContentSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// How the source document is paged
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Single raster image; every annotation lives on page 1
    Image,
    /// Multi-sheet document such as a PDF plan set
    Paged,
}

/// Current sheet of the loaded document
#[derive(Debug, Clone)]
pub struct DocumentPager {
    source: SourceKind,
    current_page: u32,
    page_count: u32,
    generation: u64,
}

impl DocumentPager {
    /// Pager for a multi-page document, starting at page 1
    pub fn paged(page_count: u32) -> Self {
        Self {
            source: SourceKind::Paged,
            current_page: 1,
            page_count: page_count.max(1),
            generation: 0,
        }
    }

    /// Pager for a single image
    pub fn image() -> Self {
        Self { source: SourceKind::Image, current_page: 1, page_count: 1, generation: 0 }
    }

    pub fn source(&self) -> SourceKind {
        self.source
    }

    /// Current 1-based page
    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Generation of the most recent render request
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Move by `delta` pages, clamped to the document
    ///
    /// Returns a ticket for the new page, or `None` when already at the bound.
    pub fn change_page(&mut self, delta: i64) -> Option<RenderTicket> {
        let target =
            i64::from(self.current_page).saturating_add(delta).clamp(1, i64::from(self.page_count));
        self.go_to_page(target as u32)
    }

    /// Jump to an absolute page, clamped to the document
    pub fn go_to_page(&mut self, page: u32) -> Option<RenderTicket> {
        let target = page.clamp(1, self.page_count);
        if target == self.current_page {
            return None;
        }
        self.current_page = target;
        Some(self.request_render())
    }

    /// Issue a ticket for rendering the current page
    ///
    /// Supersedes every ticket handed out before.
    pub fn request_render(&mut self) -> RenderTicket {
        self.generation += 1;
        debug!(page = self.current_page, generation = self.generation, "page render requested");
        RenderTicket { page: self.current_page, generation: self.generation }
    }

    /// Whether a finished render still belongs to the latest request
    pub fn is_current(&self, ticket: RenderTicket) -> bool {
        ticket.generation == self.generation && ticket.page == self.current_page
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_page_clamps_at_start() {
        let mut pager = DocumentPager::paged(3);
        assert_eq!(pager.change_page(-1), None);
        assert_eq!(pager.current_page(), 1);
    }

    #[test]
    fn test_change_page_clamps_at_end() {
        let mut pager = DocumentPager::paged(3);
        let ticket = pager.change_page(10).expect("page should change");
        assert_eq!(ticket.page, 3);
        assert_eq!(pager.current_page(), 3);
        assert_eq!(pager.change_page(1), None);
    }

    #[test]
    fn test_change_page_saturates_huge_delta() {
        let mut pager = DocumentPager::paged(3);
        assert_eq!(pager.change_page(i64::MAX).map(|t| t.page), Some(3));
        assert_eq!(pager.change_page(i64::MAX), None);
        assert_eq!(pager.change_page(i64::MIN).map(|t| t.page), Some(1));
        assert_eq!(pager.change_page(i64::MIN), None);
        assert_eq!(pager.current_page(), 1);
    }

    #[test]
    fn test_go_to_page() {
        let mut pager = DocumentPager::paged(5);
        assert_eq!(pager.go_to_page(4).map(|t| t.page), Some(4));
        assert_eq!(pager.go_to_page(0).map(|t| t.page), Some(1));
    }

    #[test]
    fn test_latest_request_wins() {
        let mut pager = DocumentPager::paged(4);
        let first = pager.change_page(1).expect("page 2");
        let second = pager.change_page(1).expect("page 3");

        assert!(!pager.is_current(first));
        assert!(pager.is_current(second));
        assert!(second.generation > first.generation);
    }

    #[test]
    fn test_returning_to_page_still_invalidates_old_ticket() {
        let mut pager = DocumentPager::paged(3);
        let to_two = pager.change_page(1).expect("page 2");
        pager.change_page(-1).expect("page 1");
        let back_to_two = pager.change_page(1).expect("page 2 again");

        assert_eq!(to_two.page, back_to_two.page);
        assert!(!pager.is_current(to_two));
        assert!(pager.is_current(back_to_two));
    }

    #[test]
    fn test_image_has_single_page() {
        let mut pager = DocumentPager::image();
        assert_eq!(pager.page_count(), 1);
        assert_eq!(pager.change_page(1), None);
        assert_eq!(pager.source(), SourceKind::Image);
    }

    #[test]
    fn test_zero_page_count_is_treated_as_one() {
        assert_eq!(DocumentPager::paged(0).page_count(), 1);
    }
}
