use crate::url::UrlShape;

/// Segment substrings that mark listing pages (English and Persian).
pub const CATEGORY_KEYWORDS: &[&str] = &[
    "category",
    "categories",
    "brand",
    "brands",
    "collection",
    "collections",
    "product-category",
    "product-brand",
    "دسته",
    "برند",
    "مجموعه",
];

/// Whether `url` looks like a category or brand page rather than a single
/// product or post.
pub fn is_category_or_brand_page(url: &str) -> bool {
    shape_is_category_or_brand(&UrlShape::parse(url))
}

pub fn shape_is_category_or_brand(shape: &UrlShape) -> bool {
    let has_keyword = shape.segments().iter().any(|segment| {
        let segment = segment.to_lowercase();
        CATEGORY_KEYWORDS
            .iter()
            .any(|keyword| segment.contains(keyword))
    });
    if has_keyword {
        return true;
    }

    // Shallow paths (/shop/electronics) are usually listing level
    (2..=3).contains(&shape.depth())
}
