//! Item normalization: validation, geometry fill-in and style attachment.

use crate::error::{Error, Result};
use crate::model::{PageInput, TextItem};

use super::metrics::MetricsEngine;
use super::options::LayoutConfig;
use super::style::StyleCache;

/// Resolve every font descriptor in the given pages into the cache.
///
/// Runs once per conversion before page workers start, so the workers only
/// need shared access to the cache.
pub fn prime_style_cache<'a>(cache: &mut StyleCache, pages: impl IntoIterator<Item = &'a PageInput>) {
    for page in pages {
        for item in &page.items {
            cache.resolve(&item.font_name);
        }
    }
    log::debug!("Style cache primed with {} font descriptors", cache.len());
}

/// Validate and complete the items of one page.
///
/// Whitespace-only items are dropped. Missing widths are estimated from the
/// resolved family, missing heights default to the font size, and bold or
/// italic flags are widened by the resolved weight and style.
pub fn normalize_page(
    page: &PageInput,
    cache: &StyleCache,
    config: &LayoutConfig,
) -> Result<Vec<TextItem>> {
    if !(page.width.is_finite() && page.height.is_finite()) || page.width <= 0.0 || page.height <= 0.0
    {
        return Err(Error::MalformedPage {
            page: page.number,
            reason: format!("invalid page size {}x{}", page.width, page.height),
        });
    }

    let metrics = MetricsEngine::new();
    let mut items = Vec::with_capacity(page.items.len());

    for source in &page.items {
        if source.text.trim().is_empty() {
            continue;
        }
        if !source.has_finite_geometry() {
            return Err(Error::MalformedPage {
                page: page.number,
                reason: format!("non-finite coordinates for {:?}", source.text),
            });
        }

        let mut item = source.clone();
        item.page = page.number;

        if item.font_size <= 0.0 {
            item.font_size = config.default_font_size;
        }

        let resolved = cache.lookup(&item.font_name);
        item.bold |= resolved.is_bold();
        item.italic |= resolved.is_italic();

        if item.width <= 0.0 {
            item.width = metrics.text_width(&item.text, item.font_size, &resolved.family);
        }
        if item.height <= 0.0 {
            item.height = item.font_size;
        }
        if item.space_width <= 0.0 {
            item.space_width = metrics.space_width(item.font_size, &resolved.family);
        }

        item.resolved = Some(resolved);
        items.push(item);
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_with(items: Vec<TextItem>) -> PageInput {
        PageInput::letter(3).with_items(items)
    }

    #[test]
    fn test_fills_geometry_and_style() {
        let page = page_with(vec![TextItem::new("Hello", 10.0, 20.0, 12.0, "ABCDEF+Arial-BoldMT")]);
        let mut cache = StyleCache::new();
        prime_style_cache(&mut cache, [&page]);

        let items = normalize_page(&page, &cache, &LayoutConfig::default()).unwrap();
        assert_eq!(items.len(), 1);

        let item = &items[0];
        assert!(item.width > 0.0);
        assert_eq!(item.height, 12.0);
        assert!(item.space_width > 0.0);
        assert!(item.bold);
        assert_eq!(item.page, 3);
        assert_eq!(item.family(), "Arial");
    }

    #[test]
    fn test_drops_whitespace_items() {
        let page = page_with(vec![
            TextItem::new("  ", 10.0, 20.0, 12.0, "Arial"),
            TextItem::new("x", 10.0, 20.0, 12.0, "Arial"),
        ]);
        let items = normalize_page(&page, &StyleCache::new(), &LayoutConfig::default()).unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_resolved_weight_widens_bold() {
        let page = page_with(vec![TextItem::new("x", 0.0, 0.0, 12.0, "Garamond-Demi")]);
        assert!(!page.items[0].bold);
        let items = normalize_page(&page, &StyleCache::new(), &LayoutConfig::default()).unwrap();
        assert!(items[0].bold);
    }

    #[test]
    fn test_non_finite_coordinates() {
        let page = page_with(vec![TextItem::new("x", f32::NAN, 0.0, 12.0, "Arial")]);
        let result = normalize_page(&page, &StyleCache::new(), &LayoutConfig::default());
        assert!(matches!(result, Err(Error::MalformedPage { page: 3, .. })));
    }

    #[test]
    fn test_zero_font_size_uses_default() {
        let page = page_with(vec![TextItem::new("x", 0.0, 0.0, 0.0, "Arial")]);
        let items = normalize_page(&page, &StyleCache::new(), &LayoutConfig::default()).unwrap();
        assert_eq!(items[0].font_size, 12.0);
    }
}
