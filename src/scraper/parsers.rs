use crate::models::RawSearchPage;
use anyhow::Result;
use scraper::{Html, Selector};

/// Pull the title and fact fragments off one search-results page.
///
/// Fragments come back as two parallel flat lists in document order; the
/// cleaner is responsible for grouping facts under their titles.
pub fn parse_search_page(
    html: &str,
    title_selector: &str,
    fact_selector: &str,
) -> Result<RawSearchPage> {
    let doc = Html::parse_document(html);

    let title_sel = Selector::parse(title_selector)
        .map_err(|e| anyhow::anyhow!("title selector: {:?}", e))?;
    let fact_sel = Selector::parse(fact_selector)
        .map_err(|e| anyhow::anyhow!("fact selector: {:?}", e))?;

    let titles: Vec<String> = doc
        .select(&title_sel)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    let facts: Vec<String> = doc
        .select(&fact_sel)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .collect();

    Ok(RawSearchPage { titles, facts })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <div class="search-result">
            <h2 class="search-result__title">Example State University</h2>
            <ul>
              <li class="search-result-fact__value">A+</li>
              <li class="search-result-fact__value">Acceptance Rate 23%</li>
              <li class="search-result-fact__value">Net Price $13,500</li>
              <li class="search-result-fact__value">SAT Range 1200-1400</li>
            </ul>
          </div>
          <div class="search-result">
            <h2 class="search-result__title">Sample College</h2>
            <ul>
              <li class="search-result-fact__value">B</li>
              <li class="search-result-fact__value">Acceptance Rate 67%</li>
              <li class="search-result-fact__value">Net Price $21,300</li>
              <li class="search-result-fact__value">SAT Range 1050-1260</li>
            </ul>
          </div>
        </body></html>
    "#;

    #[test]
    fn extracts_parallel_title_and_fact_lists() {
        let page =
            parse_search_page(PAGE, "h2.search-result__title", ".search-result-fact__value")
                .unwrap();

        assert_eq!(page.titles.len(), 2);
        assert_eq!(page.facts.len(), 8);
        assert_eq!(page.titles[0], "Example State University");
        assert_eq!(page.facts[4], "B");
    }

    #[test]
    fn missing_elements_yield_empty_lists() {
        let page = parse_search_page("<html><body></body></html>", "h2.t", ".f").unwrap();
        assert!(page.titles.is_empty());
        assert!(page.facts.is_empty());
    }

    #[test]
    fn bad_selector_is_an_error() {
        assert!(parse_search_page(PAGE, ":::", ".f").is_err());
    }
}
