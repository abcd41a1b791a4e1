//! 検索結果ページのHTML解析

use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};
use wine_digest_common::RawCandidate;

lazy_static! {
    /// 結果1行（商品ページへのリンク）
    static ref ROW: Selector = Selector::parse(ROW_SELECTOR).unwrap();
    static ref NAME: Selector = Selector::parse("p.css-54mqg2.e3wog7r0").unwrap();
    static ref SUB_NAME: Selector = Selector::parse("p.css-18wuxp4.e3wog7r0").unwrap();
    static ref PRICE: Selector = Selector::parse("p.css-tny168.enp2lf70").unwrap();
    static ref STYLE: Selector = Selector::parse("p.css-utx0um.enp2lf70").unwrap();
}

/// 結果行セレクタ（ブラウザ側の待機にも使う）
pub const ROW_SELECTOR: &str = r#"a.css-1lc3wed.enuzix00, a[href^="/produkt/vin/"]"#;

fn first_text(el: &ElementRef, selector: &Selector) -> String {
    el.select(selector)
        .next()
        .map(|e| e.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// 検索結果ページから候補行を取り出す
///
/// 名前の取れない行は飛ばす。表示名は「名前 + 副名」。
pub fn parse_search_results(html: &str) -> Vec<RawCandidate> {
    let document = Html::parse_document(html);

    document
        .select(&ROW)
        .filter_map(|row| {
            let name = first_text(&row, &NAME);
            if name.is_empty() {
                return None;
            }
            let sub_name = first_text(&row, &SUB_NAME);
            let display_name = format!("{} {}", name, sub_name).trim().to_string();

            Some(RawCandidate {
                display_name,
                href: row.value().attr("href").unwrap_or_default().to_string(),
                price_text: first_text(&row, &PRICE),
                style_text: first_text(&row, &STYLE),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESULTS_HTML: &str = r#"
<html><body>
<div class="css-1ad0061 e17wolzc0">
  <a class="css-1lc3wed enuzix00" href="/produkt/vin/catena-7243901/">
    <p class="css-54mqg2 e3wog7r0">Catena</p>
    <p class="css-18wuxp4 e3wog7r0">Cabernet Sauvignon, 2019</p>
    <p class="css-utx0um enp2lf70">Rött vin</p>
    <p class="css-tny168 enp2lf70">139:-</p>
  </a>
  <a class="css-1lc3wed enuzix00" href="/produkt/vin/breadbutter-7667101/">
    <p class="css-54mqg2 e3wog7r0"> Bread&amp;Butter </p>
    <p class="css-utx0um enp2lf70">Rött vin</p>
    <p class="css-tny168 enp2lf70">169:-</p>
  </a>
  <a class="css-1lc3wed enuzix00" href="/produkt/vin/broken-1/"></a>
</div>
</body></html>
"#;

    #[test]
    fn test_parse_search_results() {
        let rows = parse_search_results(RESULTS_HTML);
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].display_name, "Catena Cabernet Sauvignon, 2019");
        assert_eq!(rows[0].href, "/produkt/vin/catena-7243901/");
        assert_eq!(rows[0].price_text, "139:-");
        assert_eq!(rows[0].style_text, "Rött vin");
    }

    #[test]
    fn test_parse_search_results_without_sub_name() {
        let rows = parse_search_results(RESULTS_HTML);
        assert_eq!(rows[1].display_name, "Bread&Butter");
        assert_eq!(rows[1].price_text, "169:-");
    }

    #[test]
    fn test_parse_search_results_empty_page() {
        assert!(parse_search_results("<html><body><p>Inga träffar</p></body></html>").is_empty());
    }
}
