use remap_search::{is_category_or_brand_page, UrlShape};

const SYSTEM_PROMPT: &str = "You are a URL migration assistant for SEO redirects. \
Match legacy URLs to their best new URL based on topic/meaning and URL structure. \
Slugs may be in Persian. Always respond in JSON format with the required keys.";

/// System and user messages for one match decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Deterministic prompt describing `old_url` and its shortlist.
pub fn build_prompt(old_url: &str, candidates: &[String]) -> Prompt {
    let shape = UrlShape::parse(old_url);
    let primary = match shape.primary_segment() {
        "" => "none",
        segment => segment,
    };
    let category_count = candidates
        .iter()
        .filter(|c| is_category_or_brand_page(c))
        .count();

    let mut user = String::new();
    user.push_str(&format!("Old URL: {old_url}\n"));
    user.push_str(&format!("Primary segment: {primary}\n"));
    user.push_str(&format!("Path depth: {}\n\n", shape.depth()));

    user.push_str("Candidate new URLs (pre-scored by segment similarity):\n");
    for candidate in candidates {
        user.push_str(&format!("- {candidate}\n"));
    }
    user.push('\n');

    user.push_str(
        "**Matching Priority Rules:**\n\
         1. **Exact Match**: Same topic/product/post in the same primary segment (e.g., blog→blog, shop→shop)\n\
         2. **Category/Brand Fallback**: If no exact match exists, prefer category or brand pages in the same segment\n\
         3. **Segment Root Fallback**: If no category fits, use the main segment root (e.g., /shop, /blog)\n\
         4. **Cross-segment**: Only as a last resort, use a different segment\n\n\
         Additional considerations:\n\
         - **Prioritize category/brand pages** over individual products/posts when uncertain\n\
         - Consider semantic similarity (Persian-aware)\n\
         - Match URL depth when possible (product→product, not product→category unless no alternative)\n\n",
    );
    user.push_str(&format!(
        "Category/brand URLs in candidates: {category_count}\n\n"
    ));

    user.push_str(
        "Return your response as a JSON object with exactly these keys:\n\
         - best_new_url: (string) the selected URL from candidates\n\
         - confidence: (number) 0 to 1\n\
         - rationale: (string) explain which matching level was used and why",
    );

    Prompt {
        system: SYSTEM_PROMPT.to_string(),
        user,
    }
}
