//! Built-in taxonomy: general (일반), promotion (홍보) and urgent (긴급).

use crate::error::Result;
use crate::signal::{Scope, SignalKind};

use super::CategoryTable;

/// Version of the built-in signal registry.
pub const BUILTIN_VERSION: u32 = 1;

const URGENCY_TERMS: &[&str] = &[
    "urgent",
    "urgently",
    "asap",
    "immediately",
    "immediate",
    "emergency",
    "critical",
    "deadline",
    "overdue",
    "긴급",
    "급함",
    "즉시",
    "마감",
    "오늘까지",
];

const URGENCY_SUBJECT_TERMS: &[&str] = &["urgent", "asap", "emergency", "긴급", "급함"];

const PROMOTION_TERMS: &[&str] = &[
    "discount",
    "discounts",
    "promo",
    "promotion",
    "promotional",
    "sale",
    "coupon",
    "voucher",
    "deal",
    "deals",
    "clearance",
    "bargain",
    "할인",
    "광고",
    "이벤트",
    "특가",
    "쿠폰",
    "세일",
];

const BULK_MAIL_TERMS: &[&str] = &["unsubscribe", "newsletter", "수신거부"];

/// Builds the built-in category table.
///
/// `general` is the reserved default and carries no weights. An offer alone
/// is not promotional evidence, so `"urgent offer"` stays purely urgent.
///
/// # Errors
///
/// Returns an error if the built-in definitions fail validation.
pub fn builtin() -> Result<CategoryTable> {
    CategoryTable::builder()
        .version(BUILTIN_VERSION)
        .signal("urgency_terms", SignalKind::keywords(URGENCY_TERMS.iter().copied()))
        .signal(
            "urgency_subject",
            SignalKind::Keyword {
                terms: URGENCY_SUBJECT_TERMS.iter().map(ToString::to_string).collect(),
                scope: Scope::Subject,
                saturation: 1,
            },
        )
        .signal(
            "deadline_phrase",
            SignalKind::pattern(r"\b(by|before) (today|tonight|tomorrow|eod|noon|midnight)\b"),
        )
        .signal(
            "action_required",
            SignalKind::pattern(r"\b(action|response|reply) (required|needed|requested)\b"),
        )
        .signal("promotion_terms", SignalKind::keywords(PROMOTION_TERMS.iter().copied()))
        .signal("percent_off", SignalKind::pattern(r"\b\d+ % off\b"))
        .signal(
            "free_offer",
            SignalKind::pattern(r"\bfree (shipping|delivery|gift|trial)\b"),
        )
        .signal("bulk_mail", SignalKind::keywords(BULK_MAIL_TERMS.iter().copied()))
        .signal("exclamation", SignalKind::Exclamation { saturation: 3 })
        .signal(
            "shouting",
            SignalKind::Shouting {
                min_len: 3,
                saturation: 2,
            },
        )
        .category("general", "일반")
        .category("promotion", "홍보")
        .category("urgent", "긴급")
        .weight("urgent", "urgency_terms", 1.0)
        .weight("urgent", "urgency_subject", 0.5)
        .weight("urgent", "deadline_phrase", 0.75)
        .weight("urgent", "action_required", 0.75)
        .weight("urgent", "exclamation", 0.2)
        .weight("urgent", "shouting", 0.2)
        .weight("promotion", "promotion_terms", 1.0)
        .weight("promotion", "percent_off", 0.75)
        .weight("promotion", "free_offer", 0.5)
        .weight("promotion", "bulk_mail", 0.5)
        .weight("promotion", "exclamation", 0.2)
        .weight("promotion", "shouting", 0.2)
        .default_category("general")
        .build()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table_is_valid() {
        let table = builtin().unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.registry().version(), BUILTIN_VERSION);
        assert_eq!(table.default_category().id.as_str(), "general");
        assert!(table.default_category().weights.is_empty());
    }

    #[test]
    fn test_builtin_labels() {
        let table = builtin().unwrap();
        assert_eq!(table.get("urgent").unwrap().label, "긴급");
        assert_eq!(table.get("promotion").unwrap().label, "홍보");
        assert_eq!(table.get("general").unwrap().label, "일반");
    }
}
