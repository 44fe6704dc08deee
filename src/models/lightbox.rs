use super::catalog::CatalogItem;

/// Full-screen overlay for one catalog image.
///
/// `fill` switches the image from fit (letterboxed) to fill (cropped). A fresh
/// lightbox always starts in fit mode, so dismissing and reopening resets it.
#[derive(Debug, Clone, PartialEq)]
pub struct Lightbox {
    pub item: CatalogItem,
    pub fill: bool,
}

impl Lightbox {
    pub fn open(item: CatalogItem) -> Self {
        Self { item, fill: false }
    }

    /// Reopen from request state; unknown ids yield no lightbox.
    pub fn from_query(items: &[CatalogItem], view: Option<i64>, fill: bool) -> Option<Self> {
        let id = view?;
        let item = items.iter().find(|i| i.id == id)?.clone();
        Some(Self { item, fill })
    }

    pub fn toggle(&mut self) {
        self.fill = !self.fill;
    }

    /// Link that flips the fill toggle.
    pub fn toggle_href(&self) -> String {
        if self.fill {
            format!("/catalog?view={}", self.item.id)
        } else {
            format!("/catalog?view={}&fill=1", self.item.id)
        }
    }

    pub fn object_fit(&self) -> &'static str {
        if self.fill { "cover" } else { "contain" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(id: i64) -> CatalogItem {
        CatalogItem {
            id,
            title: format!("Item {id}"),
            category: "Tees".into(),
            image_url: format!("https://cdn.example.com/{id}.png"),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn opens_in_fit_mode_and_toggles() {
        let mut lb = Lightbox::open(item(1));
        assert!(!lb.fill);
        assert_eq!(lb.object_fit(), "contain");
        assert_eq!(lb.toggle_href(), "/catalog?view=1&fill=1");
        lb.toggle();
        assert!(lb.fill);
        assert_eq!(lb.object_fit(), "cover");
        assert_eq!(lb.toggle_href(), "/catalog?view=1");
    }

    #[test]
    fn from_query_ignores_unknown_ids() {
        let items = vec![item(1), item(2)];
        assert!(Lightbox::from_query(&items, None, true).is_none());
        assert!(Lightbox::from_query(&items, Some(9), false).is_none());
        let lb = Lightbox::from_query(&items, Some(2), true).unwrap();
        assert_eq!(lb.item.id, 2);
        assert!(lb.fill);
    }
}
