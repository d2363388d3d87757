//! Ad tier enumeration shared by job postings and purchase events.

use chrono::Duration;
use sea_orm::Iterable;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Purchasable promotion level of a job posting.
///
/// The integer codes are the persisted representation and must not change.
/// Promotion order is defined by [`AdTier::rank`], not by the code.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
#[serde(rename_all = "snake_case")]
pub enum AdTier {
    #[sea_orm(num_value = 0)]
    Basic,
    #[sea_orm(num_value = 1)]
    SponsoredBackground,
    #[sea_orm(num_value = 2)]
    SponsoredPinnedFor30Days,
    #[sea_orm(num_value = 3)]
    SponsoredPinnedFor7Days,
    #[sea_orm(num_value = 4)]
    WithCompanyLogo,
}

impl AdTier {
    /// Tiers that are pinned above the regular listing.
    pub const PINNED: [AdTier; 2] = [
        AdTier::SponsoredPinnedFor30Days,
        AdTier::SponsoredPinnedFor7Days,
    ];

    /// Position in the promotion order. Higher is more valuable.
    pub fn rank(self) -> u8 {
        match self {
            AdTier::Basic => 0,
            AdTier::WithCompanyLogo => 1,
            AdTier::SponsoredBackground => 2,
            AdTier::SponsoredPinnedFor7Days => 3,
            AdTier::SponsoredPinnedFor30Days => 4,
        }
    }

    pub fn is_pinned(self) -> bool {
        matches!(
            self,
            AdTier::SponsoredPinnedFor30Days | AdTier::SponsoredPinnedFor7Days
        )
    }

    /// How long a pinned tier stays in effect after approval.
    pub fn pin_duration(self) -> Option<Duration> {
        match self {
            AdTier::SponsoredPinnedFor30Days => Some(Duration::days(30)),
            AdTier::SponsoredPinnedFor7Days => Some(Duration::days(7)),
            AdTier::Basic | AdTier::SponsoredBackground | AdTier::WithCompanyLogo => None,
        }
    }

    /// All tiers strictly below `self` in the promotion order.
    pub fn ranked_below(self) -> Vec<AdTier> {
        AdTier::iter().filter(|t| t.rank() < self.rank()).collect()
    }

    /// Persisted integer code.
    pub fn code(self) -> i32 {
        self.into_value()
    }

    pub fn from_code(code: i32) -> Option<Self> {
        AdTier::try_from_value(&code).ok()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AdTier::Basic => "basic",
            AdTier::SponsoredBackground => "sponsored_background",
            AdTier::SponsoredPinnedFor30Days => "sponsored_pinned_for_30_days",
            AdTier::SponsoredPinnedFor7Days => "sponsored_pinned_for_7_days",
            AdTier::WithCompanyLogo => "with_company_logo",
        }
    }

    /// Line item shown on the checkout page and stored on the purchase event.
    pub fn description(self) -> &'static str {
        match self {
            AdTier::Basic => "Basic job ad",
            AdTier::SponsoredBackground => "Sponsored job ad with highlighted background",
            AdTier::SponsoredPinnedFor30Days => "Sponsored job ad pinned to the top for 30 days",
            AdTier::SponsoredPinnedFor7Days => "Sponsored job ad pinned to the top for 7 days",
            AdTier::WithCompanyLogo => "Job ad with company logo",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(AdTier::Basic.code(), 0);
        assert_eq!(AdTier::SponsoredBackground.code(), 1);
        assert_eq!(AdTier::SponsoredPinnedFor30Days.code(), 2);
        assert_eq!(AdTier::SponsoredPinnedFor7Days.code(), 3);
        assert_eq!(AdTier::WithCompanyLogo.code(), 4);
        assert_eq!(AdTier::from_code(3), Some(AdTier::SponsoredPinnedFor7Days));
        assert_eq!(AdTier::from_code(9), None);
    }

    #[test]
    fn promotion_order_is_total() {
        let mut tiers: Vec<AdTier> = AdTier::iter().collect();
        tiers.sort_by_key(|t| t.rank());
        assert_eq!(
            tiers,
            vec![
                AdTier::Basic,
                AdTier::WithCompanyLogo,
                AdTier::SponsoredBackground,
                AdTier::SponsoredPinnedFor7Days,
                AdTier::SponsoredPinnedFor30Days,
            ]
        );
    }

    #[test]
    fn both_pinned_tiers_count_as_pinned() {
        assert!(AdTier::SponsoredPinnedFor30Days.is_pinned());
        assert!(AdTier::SponsoredPinnedFor7Days.is_pinned());
        assert!(!AdTier::SponsoredBackground.is_pinned());
        assert!(!AdTier::WithCompanyLogo.is_pinned());
        assert!(!AdTier::Basic.is_pinned());
    }

    #[test]
    fn ranked_below_excludes_self_and_higher() {
        let below = AdTier::SponsoredPinnedFor7Days.ranked_below();
        assert_eq!(below.len(), 3);
        assert!(!below.contains(&AdTier::SponsoredPinnedFor7Days));
        assert!(!below.contains(&AdTier::SponsoredPinnedFor30Days));
        assert!(AdTier::Basic.ranked_below().is_empty());
    }

    #[test]
    fn only_pinned_tiers_expire() {
        assert_eq!(
            AdTier::SponsoredPinnedFor30Days.pin_duration(),
            Some(Duration::days(30))
        );
        assert_eq!(
            AdTier::SponsoredPinnedFor7Days.pin_duration(),
            Some(Duration::days(7))
        );
        assert_eq!(AdTier::SponsoredBackground.pin_duration(), None);
    }
}
