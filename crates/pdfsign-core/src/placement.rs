//! Signature placement model
//!
//! Tracks every signature image instance shown on the document: which page
//! it sits on and the rectangle it occupies in screen space. Ids come from a
//! running counter owned by the model and are never reused.

use crate::coords::ScreenRect;
use crate::signature::SignatureImage;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

pub type PlacementId = u64;

/// One signature image located on one page
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub id: PlacementId,
    pub source: Arc<SignatureImage>,
    /// 1-based page index
    pub page: u32,
    pub rect: ScreenRect,
    /// width / height, recorded when the placement is created
    pub aspect_ratio: f64,
    pub name: String,
}

impl Placement {
    /// Build a placement for [`PlacementModel::add`]. The id is assigned by
    /// the model; the aspect ratio is taken from the initial rectangle.
    pub fn new(source: Arc<SignatureImage>, page: u32, rect: ScreenRect, name: &str) -> Self {
        let aspect_ratio = if rect.height > 0.0 {
            rect.width / rect.height
        } else {
            0.0
        };
        Self {
            id: 0,
            source,
            page,
            rect,
            aspect_ratio,
            name: name.to_string(),
        }
    }

    pub fn summary(&self) -> PlacementSummary {
        PlacementSummary {
            id: self.id,
            page: self.page,
            x: self.rect.x,
            y: self.rect.y,
            width: self.rect.width,
            height: self.rect.height,
            name: self.name.clone(),
            mime: self.source.mime().to_string(),
        }
    }
}

/// Serializable view of a placement for UI layers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacementSummary {
    pub id: PlacementId,
    pub page: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub name: String,
    pub mime: String,
}

/// Lower bounds applied when sizing placements
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeLimits {
    /// Smallest allowed width; height is floored at `min_size / aspect_ratio`
    pub min_size: f64,
    /// Smallest factor a single resize may apply
    pub min_scale_factor: f64,
}

impl Default for SizeLimits {
    fn default() -> Self {
        Self {
            min_size: 20.0,
            min_scale_factor: 0.2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlacementModel {
    next_id: PlacementId,
    page_count: u32,
    limits: SizeLimits,
    placements: Vec<Placement>,
}

impl PlacementModel {
    pub fn new(page_count: u32, limits: SizeLimits) -> Self {
        Self {
            next_id: 0,
            page_count: page_count.max(1),
            limits,
            placements: Vec::new(),
        }
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Change the page count, pulling placements on removed pages back
    /// into range.
    pub fn set_page_count(&mut self, page_count: u32) {
        self.page_count = page_count.max(1);
        for placement in &mut self.placements {
            placement.page = placement.page.clamp(1, self.page_count);
        }
    }

    /// Add a placement and return its new id. The page is clamped into the
    /// document and the size is floored at the configured minimum.
    pub fn add(&mut self, mut placement: Placement) -> PlacementId {
        let id = self.next_id;
        self.next_id += 1;

        placement.id = id;
        placement.page = placement.page.clamp(1, self.page_count);
        self.normalize_size(&mut placement);

        debug!(id, page = placement.page, name = %placement.name, "placement added");
        self.placements.push(placement);
        id
    }

    pub fn get(&self, id: PlacementId) -> Option<&Placement> {
        self.placements.iter().find(|p| p.id == id)
    }

    fn get_mut(&mut self, id: PlacementId) -> Option<&mut Placement> {
        self.placements.iter_mut().find(|p| p.id == id)
    }

    /// Shift a placement by a screen-space delta
    pub fn move_by(&mut self, id: PlacementId, dx: f64, dy: f64) -> bool {
        if !(dx.is_finite() && dy.is_finite()) {
            return false;
        }
        match self.get_mut(id) {
            Some(p) => {
                p.rect.x += dx;
                p.rect.y += dy;
                true
            }
            None => false,
        }
    }

    /// Put a placement at an absolute position on a page (drop target)
    pub fn place_at(&mut self, id: PlacementId, x: f64, y: f64, page: u32) -> bool {
        if !(x.is_finite() && y.is_finite()) || page == 0 || page > self.page_count {
            return false;
        }
        match self.get_mut(id) {
            Some(p) => {
                p.rect.x = x;
                p.rect.y = y;
                p.page = page;
                true
            }
            None => false,
        }
    }

    /// Scale a placement. With `preserve_aspect_ratio` the height follows
    /// the width through the ratio recorded at creation.
    pub fn resize(&mut self, id: PlacementId, scale_factor: f64, preserve_aspect_ratio: bool) -> bool {
        if !(scale_factor.is_finite() && scale_factor > 0.0) {
            return false;
        }
        let limits = self.limits;
        let Some(p) = self.get_mut(id) else {
            return false;
        };

        let factor = scale_factor.max(limits.min_scale_factor);
        let width = (p.rect.width * factor).max(limits.min_size);
        let height = if preserve_aspect_ratio {
            width / p.aspect_ratio
        } else {
            (p.rect.height * factor).max(limits.min_size / p.aspect_ratio)
        };

        p.rect.width = width;
        p.rect.height = height;
        debug!(id, width, height, "placement resized");
        true
    }

    /// Set an absolute width, deriving the height from the recorded ratio
    pub fn set_width(&mut self, id: PlacementId, width: f64) -> bool {
        if !(width.is_finite() && width > 0.0) {
            return false;
        }
        let min_size = self.limits.min_size;
        let Some(p) = self.get_mut(id) else {
            return false;
        };
        p.rect.width = width.max(min_size);
        p.rect.height = p.rect.width / p.aspect_ratio;
        true
    }

    /// Copy a placement onto another page. Returns the new id.
    pub fn duplicate_to_page(&mut self, id: PlacementId, target_page: u32) -> Option<PlacementId> {
        if target_page == 0 || target_page > self.page_count {
            return None;
        }
        let copy = self.get(id)?.clone();
        Some(self.insert_copy(copy, target_page))
    }

    /// Copy a placement onto every page except its own. Returns the new ids,
    /// one per other page, in page order.
    pub fn duplicate_to_all_pages(&mut self, id: PlacementId) -> Vec<PlacementId> {
        let Some(source) = self.get(id).cloned() else {
            return Vec::new();
        };
        (1..=self.page_count)
            .filter(|&page| page != source.page)
            .map(|page| self.insert_copy(source.clone(), page))
            .collect()
    }

    fn insert_copy(&mut self, mut copy: Placement, page: u32) -> PlacementId {
        let id = self.next_id;
        self.next_id += 1;
        copy.id = id;
        copy.page = page;
        debug!(id, page, "placement duplicated");
        self.placements.push(copy);
        id
    }

    pub fn delete(&mut self, id: PlacementId) -> bool {
        if let Some(pos) = self.placements.iter().position(|p| p.id == id) {
            self.placements.remove(pos);
            debug!(id, "placement deleted");
            true
        } else {
            false
        }
    }

    /// Move a placement to the end of the draw order
    pub fn bring_to_front(&mut self, id: PlacementId) -> bool {
        if let Some(pos) = self.placements.iter().position(|p| p.id == id) {
            let placement = self.placements.remove(pos);
            self.placements.push(placement);
            true
        } else {
            false
        }
    }

    /// Restore creation order
    pub fn sort_by_id(&mut self) {
        self.placements.sort_by_key(|p| p.id);
    }

    pub fn list_for_page(&self, page: u32) -> Vec<&Placement> {
        self.placements.iter().filter(|p| p.page == page).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Placement> {
        self.placements.iter()
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// Drop every placement. The id counter keeps running.
    pub fn clear(&mut self) {
        self.placements.clear();
    }

    pub fn summaries(&self) -> Vec<PlacementSummary> {
        self.placements.iter().map(Placement::summary).collect()
    }

    fn normalize_size(&self, placement: &mut Placement) {
        let min_size = self.limits.min_size;
        let rect = &mut placement.rect;
        if !(rect.width.is_finite() && rect.width > 0.0) {
            rect.width = min_size;
        }
        if !(rect.height.is_finite() && rect.height > 0.0) {
            rect.height = min_size;
        }
        if !(placement.aspect_ratio.is_finite() && placement.aspect_ratio > 0.0) {
            placement.aspect_ratio = rect.width / rect.height;
        }
        if rect.width < min_size {
            rect.width = min_size;
            rect.height = min_size / placement.aspect_ratio;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::fixtures::png_rgba;

    fn image() -> Arc<SignatureImage> {
        Arc::new(SignatureImage::new("image/png", png_rgba(4, 2, [0, 0, 0, 255])).unwrap())
    }

    fn model(pages: u32) -> PlacementModel {
        PlacementModel::new(pages, SizeLimits::default())
    }

    fn sig(page: u32, x: f64, y: f64, w: f64, h: f64) -> Placement {
        Placement::new(image(), page, ScreenRect::new(x, y, w, h), "sign 1")
    }

    #[test]
    fn test_new_model_is_empty() {
        let model = model(3);
        assert!(model.is_empty());
        assert_eq!(model.len(), 0);
        assert_eq!(model.page_count(), 3);
    }

    #[test]
    fn test_add_returns_unique_ids() {
        let mut model = model(1);
        let a = model.add(sig(1, 0.0, 0.0, 100.0, 50.0));
        let b = model.add(sig(1, 0.0, 0.0, 100.0, 50.0));
        assert_ne!(a, b);
        assert_eq!(model.get(a).unwrap().id, a);
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let mut model = model(1);
        let a = model.add(sig(1, 0.0, 0.0, 100.0, 50.0));
        let b = model.add(sig(1, 0.0, 0.0, 100.0, 50.0));
        assert!(model.delete(a));
        let c = model.add(sig(1, 0.0, 0.0, 100.0, 50.0));
        assert_ne!(c, a);
        assert_ne!(c, b);
    }

    #[test]
    fn test_add_clamps_page() {
        let mut model = model(3);
        let id = model.add(sig(9, 0.0, 0.0, 100.0, 50.0));
        assert_eq!(model.get(id).unwrap().page, 3);
        let id = model.add(sig(0, 0.0, 0.0, 100.0, 50.0));
        assert_eq!(model.get(id).unwrap().page, 1);
    }

    #[test]
    fn test_add_floors_tiny_size() {
        let mut model = model(1);
        let id = model.add(sig(1, 0.0, 0.0, 10.0, 5.0));
        let p = model.get(id).unwrap();
        assert_eq!(p.rect.width, 20.0);
        assert_eq!(p.rect.height, 10.0);
        assert_eq!(p.aspect_ratio, 2.0);
    }

    #[test]
    fn test_move_by() {
        let mut model = model(1);
        let id = model.add(sig(1, 10.0, 20.0, 100.0, 50.0));
        assert!(model.move_by(id, 5.0, -5.0));
        let rect = model.get(id).unwrap().rect;
        assert_eq!((rect.x, rect.y), (15.0, 15.0));
    }

    #[test]
    fn test_unknown_id_is_noop() {
        let mut model = model(2);
        model.add(sig(1, 0.0, 0.0, 100.0, 50.0));
        let before = model.summaries();

        assert!(!model.move_by(42, 1.0, 1.0));
        assert!(!model.resize(42, 2.0, true));
        assert!(!model.delete(42));
        assert!(!model.bring_to_front(42));
        assert!(model.duplicate_to_page(42, 2).is_none());
        assert!(model.duplicate_to_all_pages(42).is_empty());

        assert_eq!(model.summaries(), before);
    }

    #[test]
    fn test_resize_preserves_ratio() {
        let mut model = model(1);
        let id = model.add(sig(1, 0.0, 0.0, 150.0, 75.0));
        assert!(model.resize(id, 1.1, true));
        let rect = model.get(id).unwrap().rect;
        assert!((rect.width - 165.0).abs() < 1e-9);
        assert!((rect.width / rect.height - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_resize_floors_at_min_size() {
        let mut model = model(1);
        let id = model.add(sig(1, 0.0, 0.0, 100.0, 50.0));
        for _ in 0..50 {
            model.resize(id, 0.5, true);
        }
        let rect = model.get(id).unwrap().rect;
        assert_eq!(rect.width, 20.0);
        assert_eq!(rect.height, 10.0);
    }

    #[test]
    fn test_resize_floors_scale_factor() {
        let mut model = model(1);
        let id = model.add(sig(1, 0.0, 0.0, 400.0, 200.0));
        // 0.01 is raised to the 0.2 floor
        assert!(model.resize(id, 0.01, true));
        assert_eq!(model.get(id).unwrap().rect.width, 80.0);
    }

    #[test]
    fn test_resize_rejects_bad_factor() {
        let mut model = model(1);
        let id = model.add(sig(1, 0.0, 0.0, 100.0, 50.0));
        assert!(!model.resize(id, 0.0, true));
        assert!(!model.resize(id, -1.0, true));
        assert!(!model.resize(id, f64::NAN, true));
        assert_eq!(model.get(id).unwrap().rect.width, 100.0);
    }

    #[test]
    fn test_free_resize_keeps_recorded_ratio() {
        let mut model = model(1);
        let id = model.add(sig(1, 0.0, 0.0, 100.0, 50.0));
        model.resize(id, 2.0, false);
        let p = model.get(id).unwrap();
        assert_eq!((p.rect.width, p.rect.height), (200.0, 100.0));
        assert_eq!(p.aspect_ratio, 2.0);
    }

    #[test]
    fn test_set_width_uses_ratio() {
        let mut model = model(1);
        let id = model.add(sig(1, 0.0, 0.0, 100.0, 25.0));
        assert!(model.set_width(id, 200.0));
        let rect = model.get(id).unwrap().rect;
        assert_eq!((rect.width, rect.height), (200.0, 50.0));
    }

    #[test]
    fn test_place_at() {
        let mut model = model(3);
        let id = model.add(sig(1, 0.0, 0.0, 100.0, 50.0));
        assert!(model.place_at(id, 30.0, 40.0, 2));
        let p = model.get(id).unwrap();
        assert_eq!((p.rect.x, p.rect.y, p.page), (30.0, 40.0, 2));
        assert!(!model.place_at(id, 0.0, 0.0, 4));
        assert_eq!(model.get(id).unwrap().page, 2);
    }

    #[test]
    fn test_duplicate_to_page() {
        let mut model = model(2);
        let id = model.add(sig(1, 10.0, 10.0, 100.0, 50.0));
        let copy = model.duplicate_to_page(id, 2).unwrap();
        assert_ne!(copy, id);

        let original = model.get(id).unwrap();
        let duplicate = model.get(copy).unwrap();
        assert_eq!(duplicate.page, 2);
        assert_eq!(duplicate.rect, original.rect);
        assert_eq!(duplicate.name, original.name);
        assert!(Arc::ptr_eq(&duplicate.source, &original.source));
    }

    #[test]
    fn test_duplicate_to_page_out_of_range() {
        let mut model = model(2);
        let id = model.add(sig(1, 0.0, 0.0, 100.0, 50.0));
        assert!(model.duplicate_to_page(id, 3).is_none());
        assert!(model.duplicate_to_page(id, 0).is_none());
        assert_eq!(model.len(), 1);
    }

    #[test]
    fn test_duplicate_to_all_pages_example() {
        let mut model = model(3);
        let id = model.add(sig(1, 50.0, 50.0, 150.0, 75.0));
        let copies = model.duplicate_to_all_pages(id);
        assert_eq!(copies.len(), 2);
        assert_eq!(model.len(), 3);

        for page in 1..=3 {
            let on_page = model.list_for_page(page);
            assert_eq!(on_page.len(), 1, "page {}", page);
            assert_eq!(on_page[0].rect, ScreenRect::new(50.0, 50.0, 150.0, 75.0));
        }
    }

    #[test]
    fn test_bring_to_front_and_sort() {
        let mut model = model(1);
        let a = model.add(sig(1, 0.0, 0.0, 100.0, 50.0));
        let b = model.add(sig(1, 0.0, 0.0, 100.0, 50.0));
        assert!(model.bring_to_front(a));
        let order: Vec<_> = model.iter().map(|p| p.id).collect();
        assert_eq!(order, vec![b, a]);

        model.sort_by_id();
        let order: Vec<_> = model.iter().map(|p| p.id).collect();
        assert_eq!(order, vec![a, b]);
    }

    #[test]
    fn test_set_page_count_clamps() {
        let mut model = model(5);
        let id = model.add(sig(5, 0.0, 0.0, 100.0, 50.0));
        model.set_page_count(2);
        assert_eq!(model.get(id).unwrap().page, 2);
    }

    #[test]
    fn test_json_summaries() {
        let mut model = model(1);
        model.add(sig(1, 1.0, 2.0, 100.0, 50.0));
        let value = serde_json::to_value(model.summaries()).unwrap();
        assert_eq!(value[0]["id"], 0);
        assert_eq!(value[0]["mime"], "image/png");
        assert_eq!(value[0]["name"], "sign 1");
    }
}
