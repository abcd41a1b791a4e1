//! 名前の類似度
//!
//! - strip_years: ヴィンテージ年（19xx / 20xx）を除去
//! - sequence_ratio: 最長一致ブロックの再帰分割による一致率（編集距離ではない）
//! - match_score: 年除去後の一致率を 0〜100、小数1桁に丸めたもの

use regex::Regex;
use std::collections::HashMap;

/// 自動ジャンク判定が有効になる長さ
const AUTOJUNK_MIN_LEN: usize = 200;

/// 4桁の年トークン（19xx / 20xx）を全て除去する
///
/// 前後の空白や句読点は残す（`"..., 2019"` → `"..., "`）。
/// 単語境界で判定するので `"19 Crimes"` の `19` は残る。
pub fn strip_years(s: &str) -> String {
    lazy_static::lazy_static! {
        static ref YEAR_RE: Regex = Regex::new(r"\b(?:19|20)\d{2}\b").unwrap();
    }
    YEAR_RE.replace_all(s, "").into_owned()
}

/// 2文字列の一致率（0.0〜1.0）
///
/// 一致ブロックの合計長 M と総文字数 T から `2M / T` を返す。
/// 引数の順序で最長一致の選び方が変わらないよう、辞書順で小さい方を左に置く。
pub fn sequence_ratio(a: &str, b: &str) -> f64 {
    let (left, right) = if a <= b { (a, b) } else { (b, a) };
    let left: Vec<char> = left.chars().collect();
    let right: Vec<char> = right.chars().collect();

    let total = left.len() + right.len();
    if total == 0 {
        return 1.0;
    }

    let matches = SequenceMatcher::new(&left, &right).matched_len();
    2.0 * matches as f64 / total as f64
}

/// 照合スコア（年除去後の一致率 × 100、小数1桁）
pub fn match_score(a: &str, b: &str) -> f64 {
    let ratio = sequence_ratio(&strip_years(a), &strip_years(b));
    (ratio * 1000.0).round() / 10.0
}

struct SequenceMatcher<'a> {
    a: &'a [char],
    b: &'a [char],
    /// b 側の文字 → 出現位置（昇順）
    b2j: HashMap<char, Vec<usize>>,
}

impl<'a> SequenceMatcher<'a> {
    fn new(a: &'a [char], b: &'a [char]) -> Self {
        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, &c) in b.iter().enumerate() {
            b2j.entry(c).or_default().push(j);
        }

        // 長い文字列では頻出文字を索引から外す
        let n = b.len();
        if n >= AUTOJUNK_MIN_LEN {
            let limit = n / 100 + 1;
            b2j.retain(|_, positions| positions.len() <= limit);
        }

        Self { a, b, b2j }
    }

    /// a[alo..ahi] と b[blo..bhi] の最長一致 (i, j, size)
    ///
    /// 同じ長さなら a 側、次に b 側で先に現れるものを選ぶ。
    fn find_longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> (usize, usize, usize) {
        let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);
        let mut j2len: HashMap<usize, usize> = HashMap::new();

        for i in alo..ahi {
            let mut new_j2len: HashMap<usize, usize> = HashMap::new();
            if let Some(positions) = self.b2j.get(&self.a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| j2len.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    new_j2len.insert(j, k);
                    if k > best_size {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_size = k;
                    }
                }
            }
            j2len = new_j2len;
        }

        // 索引から外した頻出文字の分だけ前後に伸ばす
        while best_i > alo && best_j > blo && self.a[best_i - 1] == self.b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_size += 1;
        }
        while best_i + best_size < ahi
            && best_j + best_size < bhi
            && self.a[best_i + best_size] == self.b[best_j + best_size]
        {
            best_size += 1;
        }

        (best_i, best_j, best_size)
    }

    /// 一致ブロックの合計長
    fn matched_len(&self) -> usize {
        let mut total = 0;
        let mut queue = vec![(0, self.a.len(), 0, self.b.len())];

        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let (i, j, k) = self.find_longest_match(alo, ahi, blo, bhi);
            if k == 0 {
                continue;
            }
            total += k;
            if alo < i && blo < j {
                queue.push((alo, i, blo, j));
            }
            if i + k < ahi && j + k < bhi {
                queue.push((i + k, ahi, j + k, bhi));
            }
        }

        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_years_trailing_vintage() {
        assert_eq!(
            strip_years("Zenato Valpolicella Classico Superiore, 2019"),
            "Zenato Valpolicella Classico Superiore, "
        );
    }

    #[test]
    fn test_strip_years_nineteen_hundreds() {
        assert_eq!(strip_years("Vega Sicilia Unico 1998"), "Vega Sicilia Unico ");
    }

    #[test]
    fn test_strip_years_keeps_short_numbers() {
        assert_eq!(strip_years("19 Crimes Red Blend"), "19 Crimes Red Blend");
        assert_eq!(strip_years("Cuvée 1850 Reserva"), "Cuvée 1850 Reserva");
        assert_eq!(strip_years("Lot 20190"), "Lot 20190");
    }

    #[test]
    fn test_strip_years_idempotent() {
        let inputs = [
            "Doppio Passo Primitivo, 2021",
            "2019-2020 Blend",
            "Château 1999 2001 2099",
            "ingen årgång",
            "",
        ];
        for input in inputs {
            let once = strip_years(input);
            assert_eq!(strip_years(&once), once, "入力: {}", input);
        }
    }

    #[test]
    fn test_sequence_ratio_known_values() {
        // difflib: SequenceMatcher(None, "abcd", "bcde").ratio() == 0.75
        assert!((sequence_ratio("abcd", "bcde") - 0.75).abs() < 1e-9);
        assert_eq!(sequence_ratio("", ""), 1.0);
        assert_eq!(sequence_ratio("abc", ""), 0.0);
    }

    #[test]
    fn test_sequence_ratio_multiple_blocks() {
        // "abxcd" / "abcd": ab + cd が一致 → 2*4/9
        let ratio = sequence_ratio("abxcd", "abcd");
        assert!((ratio - 8.0 / 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_match_score_self_is_hundred() {
        let names = [
            "Doppio Passo Primitivo",
            "Garzón Reserva Tannat, 2020",
            "Bread&Butter Pinot Noir",
        ];
        for name in names {
            assert_eq!(match_score(name, name), 100.0);
        }
    }

    #[test]
    fn test_match_score_symmetric() {
        let pairs = [
            ("Doppio Passo Primitivo", "Doppio Passo Organic Primitivo, 2020"),
            ("Catena Cabernet Sauvignon", "Bread and Butter Pinot Noir"),
            ("abab", "baba"),
            ("19 Crimes Red Blend", "19 Crimes The Banished Dark Red"),
        ];
        for (a, b) in pairs {
            assert_eq!(match_score(a, b), match_score(b, a), "{} / {}", a, b);
        }
    }

    #[test]
    fn test_match_score_ignores_vintage() {
        assert_eq!(
            match_score("Doppio Passo Primitivo", "Doppio Passo Primitivo, 2021"),
            match_score("Doppio Passo Primitivo", "Doppio Passo Primitivo, ")
        );
        assert!(match_score("Doppio Passo Primitivo", "Doppio Passo Primitivo, 2021") > 90.0);
    }

    #[test]
    fn test_match_score_unrelated_is_low() {
        assert!(match_score("Catena Cabernet Sauvignon", "Bread and Butter Pinot Noir") < 70.0);
    }

    #[test]
    fn test_match_score_one_decimal() {
        let score = match_score("abcd", "bcdef");
        assert_eq!(score, (score * 10.0).round() / 10.0);
    }
}
