//! Wine Digest Common Library
//!
//! カタログ検索のコア（ラダー検索・類似度照合）と配信用の整形処理。
//! I/Oを持たないので、CLI本体とテストの両方から同期的に使える。

pub mod types;
pub mod error;
pub mod similarity;
pub mod relaxation;
pub mod confirmation;
pub mod digest;

pub use types::{ConfirmedMatch, EnrichedMatch, ExternalRatingEntry, RawCandidate, WineDetails};
pub use error::{Error, Result};
pub use similarity::{match_score, sequence_ratio, strip_years};
pub use relaxation::{AttemptOutcome, LadderState, SearchOutcome, SearchQuery, Step};
pub use confirmation::{confirm, DEFAULT_THRESHOLD};
pub use digest::{render_telegram_messages, render_telegraph_html, toplist_title, wine_style_to_emoji, StyleMessage};
