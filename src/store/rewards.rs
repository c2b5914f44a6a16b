//! Loyalty points ledger.
//!
//! Append-only transactions plus a cached balance and tier per user. Every
//! credit runs its checks, balance update and append under one lock, so a
//! retried credit with the same reference can never land twice.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::calculation::{compute_points, resolve_tier};
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::models::{RewardTransaction, UserRewardState};

/// Why a credit was not applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RewardRejection {
    /// The reference was already credited. Not an error for the end user.
    Duplicate {
        /// The transaction that already holds the reference.
        existing_transaction_id: Uuid,
    },
    /// The user is not enrolled.
    UserNotFound {
        /// The user id supplied.
        user_id: String,
    },
    /// No catalog entry has this slug.
    UnknownAction {
        /// The slug supplied.
        action_slug: String,
    },
    /// The action no longer earns points.
    ActionInactive {
        /// The action slug.
        action_slug: String,
    },
    /// A one-time action was already credited to this user.
    AlreadyEarned {
        /// The action slug.
        action_slug: String,
    },
    /// The action's cooldown has not elapsed.
    CooldownActive {
        /// Earliest instant the action can be credited again.
        available_at: DateTime<Utc>,
    },
    /// The action hit its weekly cap for this user.
    WeeklyLimitReached {
        /// The weekly cap.
        max_times_per_week: u32,
    },
}

impl std::fmt::Display for RewardRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RewardRejection::Duplicate {
                existing_transaction_id,
            } => write!(
                f,
                "Reward already credited in transaction {}",
                existing_transaction_id
            ),
            RewardRejection::UserNotFound { user_id } => {
                write!(f, "User '{}' is not enrolled in rewards", user_id)
            }
            RewardRejection::UnknownAction { action_slug } => {
                write!(f, "Unknown reward action '{}'", action_slug)
            }
            RewardRejection::ActionInactive { action_slug } => {
                write!(f, "Reward action '{}' is inactive", action_slug)
            }
            RewardRejection::AlreadyEarned { action_slug } => {
                write!(f, "Reward action '{}' can only be earned once", action_slug)
            }
            RewardRejection::CooldownActive { available_at } => {
                write!(f, "Reward action on cooldown until {}", available_at)
            }
            RewardRejection::WeeklyLimitReached { max_times_per_week } => write!(
                f,
                "Reward action limit of {} per week reached",
                max_times_per_week
            ),
        }
    }
}

/// A successful credit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreditReceipt {
    /// The appended transaction.
    pub transaction: RewardTransaction,
    /// True when the credit moved the user to a higher tier.
    pub tier_upgraded: bool,
    /// Tier before the credit.
    pub previous_tier: Option<String>,
    /// Tier after the credit.
    pub new_tier: Option<String>,
}

/// The result of a credit attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum CreditOutcome {
    /// Points were credited.
    Credited(CreditReceipt),
    /// Nothing changed.
    Rejected(RewardRejection),
}

#[derive(Debug, Default)]
struct LedgerState {
    users: HashMap<String, UserRewardState>,
    transactions: Vec<RewardTransaction>,
    by_reference: HashMap<(String, String, String), Uuid>,
}

impl LedgerState {
    fn action_history<'a>(
        &'a self,
        user_id: &'a str,
        action_slug: &'a str,
    ) -> impl Iterator<Item = &'a RewardTransaction> + 'a {
        self.transactions
            .iter()
            .filter(move |t| t.user_id == user_id && t.action_slug == action_slug)
    }
}

/// The rewards ledger.
pub struct RewardsLedger {
    config: Arc<EngineConfig>,
    clock: Arc<dyn Clock>,
    state: Mutex<LedgerState>,
}

impl std::fmt::Debug for RewardsLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RewardsLedger")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

fn custom_multiplier(metadata: &serde_json::Value) -> Decimal {
    let parsed = match metadata.get("multiplier") {
        None | Some(serde_json::Value::Null) => return Decimal::ONE,
        Some(serde_json::Value::String(s)) => Decimal::from_str(s.trim()).ok(),
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .map(Decimal::from)
            .or_else(|| n.as_f64().and_then(Decimal::from_f64)),
        Some(_) => None,
    };
    parsed.unwrap_or_else(|| {
        warn!(metadata = %metadata, "Ignoring unparseable reward multiplier");
        Decimal::ONE
    })
}

impl RewardsLedger {
    /// Creates an empty ledger.
    pub fn new(config: Arc<EngineConfig>, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            state: Mutex::new(LedgerState::default()),
        }
    }

    /// Enrolls a user at zero points. Enrolling twice is a no-op.
    pub fn enroll(&self, user_id: &str) -> UserRewardState {
        let mut state = self.state.lock();
        let starting_tier = resolve_tier(self.config.tiers(), 0).map(|t| t.slug.clone());
        state
            .users
            .entry(user_id.to_string())
            .or_insert_with(|| {
                debug!(user_id, "Enrolled in rewards");
                UserRewardState {
                    user_id: user_id.to_string(),
                    points: 0,
                    tier: starting_tier,
                }
            })
            .clone()
    }

    /// The cached balance and tier for a user.
    pub fn state(&self, user_id: &str) -> Option<UserRewardState> {
        self.state.lock().users.get(user_id).cloned()
    }

    /// A user's transactions, newest first.
    pub fn history(&self, user_id: &str) -> Vec<RewardTransaction> {
        let state = self.state.lock();
        state
            .transactions
            .iter()
            .rev()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Credits points for an action.
    ///
    /// Checks run in order: user enrolled, reference not already credited,
    /// action known, action active, one-time action not yet earned, cooldown
    /// elapsed, weekly cap not reached. Points are
    /// `round(points_base * tier multiplier * metadata.multiplier)`, clamped
    /// at zero. The tier is re-evaluated against the new balance and only
    /// ever moves up.
    pub fn credit_points(
        &self,
        user_id: &str,
        action_slug: &str,
        reference_id: Option<&str>,
        metadata: serde_json::Value,
    ) -> CreditOutcome {
        let now = self.clock.now();
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let Some(user) = state.users.get(user_id) else {
            return CreditOutcome::Rejected(RewardRejection::UserNotFound {
                user_id: user_id.to_string(),
            });
        };

        let reference_key = reference_id.map(|reference| {
            (
                user_id.to_string(),
                action_slug.to_string(),
                reference.to_string(),
            )
        });
        if let Some(existing) = reference_key
            .as_ref()
            .and_then(|key| state.by_reference.get(key))
        {
            debug!(user_id, action_slug, ?reference_id, "Duplicate reward credit ignored");
            return CreditOutcome::Rejected(RewardRejection::Duplicate {
                existing_transaction_id: *existing,
            });
        }

        let Some(action) = self.config.reward_action(action_slug) else {
            return CreditOutcome::Rejected(RewardRejection::UnknownAction {
                action_slug: action_slug.to_string(),
            });
        };
        if !action.is_active {
            return CreditOutcome::Rejected(RewardRejection::ActionInactive {
                action_slug: action_slug.to_string(),
            });
        }

        let last_earned = state.action_history(user_id, action_slug).last();
        if !action.is_recurring && last_earned.is_some() {
            return CreditOutcome::Rejected(RewardRejection::AlreadyEarned {
                action_slug: action_slug.to_string(),
            });
        }
        if let (Some(hours), Some(last)) = (action.cooldown_hours, last_earned) {
            // Past the representable range the cooldown never ends.
            let available_at = last
                .created_at
                .checked_add_signed(Duration::hours(i64::from(hours)))
                .unwrap_or(DateTime::<Utc>::MAX_UTC);
            if now < available_at {
                return CreditOutcome::Rejected(RewardRejection::CooldownActive { available_at });
            }
        }
        if let Some(max) = action.max_times_per_week {
            let week_start = now - Duration::days(7);
            let this_week = state
                .action_history(user_id, action_slug)
                .filter(|t| t.created_at > week_start)
                .count();
            if this_week >= max as usize {
                return CreditOutcome::Rejected(RewardRejection::WeeklyLimitReached {
                    max_times_per_week: max,
                });
            }
        }

        let previous_tier = user.tier.clone();
        let tier_multiplier = previous_tier
            .as_deref()
            .and_then(|slug| self.config.tier(slug))
            .map(|tier| tier.multiplier);
        let points = compute_points(
            action.points_base,
            tier_multiplier,
            custom_multiplier(&metadata),
        );
        let balance_after = user.points.saturating_add(points);

        let new_tier = if points == 0 {
            previous_tier.clone()
        } else {
            let current_floor = previous_tier
                .as_deref()
                .and_then(|slug| self.config.tier(slug))
                .map(|tier| tier.min_points);
            match resolve_tier(self.config.tiers(), balance_after) {
                Some(candidate) if current_floor.is_none_or(|floor| candidate.min_points > floor) => {
                    Some(candidate.slug.clone())
                }
                _ => previous_tier.clone(),
            }
        };
        let tier_upgraded = new_tier != previous_tier;

        let transaction = RewardTransaction {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            action_slug: action_slug.to_string(),
            reference_id: reference_id.map(str::to_string),
            points,
            balance_after,
            metadata,
            created_at: now,
        };

        if let Some(user) = state.users.get_mut(user_id) {
            user.points = balance_after;
            user.tier = new_tier.clone();
        }
        if let Some(key) = reference_key {
            state.by_reference.insert(key, transaction.id);
        }
        state.transactions.push(transaction.clone());

        info!(
            user_id,
            action_slug,
            points,
            balance_after,
            tier_upgraded,
            "Reward points credited"
        );

        CreditOutcome::Credited(CreditReceipt {
            transaction,
            tier_upgraded,
            previous_tier,
            new_tier,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::config::EngineSettings;
    use crate::models::{RewardAction, TierDefinition};
    use chrono::TimeZone;
    use std::thread;

    fn action(slug: &str, points_base: i64) -> RewardAction {
        RewardAction {
            slug: slug.to_string(),
            name: slug.to_string(),
            points_base,
            cooldown_hours: None,
            max_times_per_week: None,
            is_recurring: true,
            is_active: true,
        }
    }

    fn tier(slug: &str, min_points: i64, multiplier: Decimal) -> TierDefinition {
        TierDefinition {
            slug: slug.to_string(),
            name: slug.to_string(),
            min_points,
            multiplier,
        }
    }

    fn create_test_config() -> Arc<EngineConfig> {
        let mut review = action("review_written", 50);
        review.cooldown_hours = Some(24);
        review.max_times_per_week = Some(3);
        let mut profile = action("profile_completed", 100);
        profile.is_recurring = false;
        let mut check_in = action("daily_check_in", 5);
        check_in.is_active = false;
        let mut referral = action("referral_signup", 500);
        referral.max_times_per_week = Some(2);
        let mut anniversary = action("host_anniversary", 20);
        anniversary.cooldown_hours = Some(u32::MAX);

        Arc::new(EngineConfig::new(
            EngineSettings::default(),
            vec![
                tier("member", 0, Decimal::ONE),
                tier("silver", 1_000, Decimal::new(11, 1)),
                tier("gold", 5_000, Decimal::new(12, 1)),
            ],
            vec![
                action("booking_completed", 250),
                action("zero_action", 0),
                review,
                profile,
                check_in,
                referral,
                anniversary,
            ],
        ))
    }

    fn create_ledger() -> (RewardsLedger, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
        ));
        let ledger = RewardsLedger::new(create_test_config(), clock.clone());
        (ledger, clock)
    }

    fn credited(outcome: CreditOutcome) -> CreditReceipt {
        match outcome {
            CreditOutcome::Credited(receipt) => receipt,
            CreditOutcome::Rejected(rejection) => panic!("Expected credit, got {:?}", rejection),
        }
    }

    fn rejected(outcome: CreditOutcome) -> RewardRejection {
        match outcome {
            CreditOutcome::Rejected(rejection) => rejection,
            CreditOutcome::Credited(receipt) => panic!("Expected rejection, got {:?}", receipt),
        }
    }

    fn seed_gold_user(ledger: &RewardsLedger, user_id: &str) {
        ledger.enroll(user_id);
        let mut state = ledger.state.lock();
        let user = state.users.get_mut(user_id).unwrap();
        user.points = 6_000;
        user.tier = Some("gold".to_string());
    }

    /// RW-001: gold user completing a booking earns 300 points
    #[test]
    fn test_gold_user_booking_completed() {
        let (ledger, _) = create_ledger();
        seed_gold_user(&ledger, "u1");

        let receipt = credited(ledger.credit_points(
            "u1",
            "booking_completed",
            Some("booking-1"),
            serde_json::json!({}),
        ));
        assert_eq!(receipt.transaction.points, 300);
        assert_eq!(receipt.transaction.balance_after, 6_300);
        assert!(!receipt.tier_upgraded);
    }

    /// RW-002: same reference twice yields one transaction
    #[test]
    fn test_duplicate_reference_is_noop() {
        let (ledger, _) = create_ledger();
        ledger.enroll("u1");

        let first = credited(ledger.credit_points(
            "u1",
            "booking_completed",
            Some("booking-1"),
            serde_json::json!({}),
        ));
        let second = rejected(ledger.credit_points(
            "u1",
            "booking_completed",
            Some("booking-1"),
            serde_json::json!({}),
        ));

        assert_eq!(
            second,
            RewardRejection::Duplicate {
                existing_transaction_id: first.transaction.id
            }
        );
        assert_eq!(ledger.history("u1").len(), 1);
        assert_eq!(ledger.state("u1").unwrap().points, 250);
    }

    /// RW-003: concurrent retries of the same credit land once
    #[test]
    fn test_concurrent_duplicate_credits() {
        let (ledger, _) = create_ledger();
        let ledger = Arc::new(ledger);
        ledger.enroll("u1");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                thread::spawn(move || {
                    matches!(
                        ledger.credit_points(
                            "u1",
                            "booking_completed",
                            Some("booking-1"),
                            serde_json::json!({})
                        ),
                        CreditOutcome::Credited(_)
                    )
                })
            })
            .collect();

        let credits = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|c| *c)
            .count();
        assert_eq!(credits, 1);
        assert_eq!(ledger.state("u1").unwrap().points, 250);
    }

    /// RW-004: crossing a threshold upgrades the tier
    #[test]
    fn test_tier_upgrade_flagged() {
        let (ledger, _) = create_ledger();
        ledger.enroll("u1");
        ledger.state.lock().users.get_mut("u1").unwrap().points = 900;

        let receipt = credited(ledger.credit_points(
            "u1",
            "booking_completed",
            Some("booking-1"),
            serde_json::json!({}),
        ));
        assert!(receipt.tier_upgraded);
        assert_eq!(receipt.previous_tier.as_deref(), Some("member"));
        assert_eq!(receipt.new_tier.as_deref(), Some("silver"));
        assert_eq!(ledger.state("u1").unwrap().tier.as_deref(), Some("silver"));
    }

    /// RW-005: zero-point credit never changes the tier
    #[test]
    fn test_zero_credit_keeps_tier() {
        let (ledger, _) = create_ledger();
        ledger.enroll("u1");
        {
            let mut state = ledger.state.lock();
            let user = state.users.get_mut("u1").unwrap();
            user.points = 2_000;
            user.tier = Some("member".to_string());
        }

        let receipt = credited(ledger.credit_points("u1", "zero_action", None, serde_json::json!({})));
        assert_eq!(receipt.transaction.points, 0);
        assert!(!receipt.tier_upgraded);
        assert_eq!(receipt.new_tier.as_deref(), Some("member"));
    }

    #[test]
    fn test_unknown_user() {
        let (ledger, _) = create_ledger();
        assert_eq!(
            rejected(ledger.credit_points("ghost", "booking_completed", None, serde_json::json!({}))),
            RewardRejection::UserNotFound {
                user_id: "ghost".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_and_inactive_actions() {
        let (ledger, _) = create_ledger();
        ledger.enroll("u1");
        assert!(matches!(
            rejected(ledger.credit_points("u1", "nope", None, serde_json::json!({}))),
            RewardRejection::UnknownAction { .. }
        ));
        assert!(matches!(
            rejected(ledger.credit_points("u1", "daily_check_in", None, serde_json::json!({}))),
            RewardRejection::ActionInactive { .. }
        ));
    }

    #[test]
    fn test_non_recurring_action_earned_once() {
        let (ledger, _) = create_ledger();
        ledger.enroll("u1");
        credited(ledger.credit_points("u1", "profile_completed", None, serde_json::json!({})));
        assert!(matches!(
            rejected(ledger.credit_points("u1", "profile_completed", None, serde_json::json!({}))),
            RewardRejection::AlreadyEarned { .. }
        ));
    }

    #[test]
    fn test_cooldown_then_available() {
        let (ledger, clock) = create_ledger();
        ledger.enroll("u1");
        credited(ledger.credit_points("u1", "review_written", Some("r1"), serde_json::json!({})));

        clock.advance(Duration::hours(23));
        let rejection = rejected(ledger.credit_points(
            "u1",
            "review_written",
            Some("r2"),
            serde_json::json!({}),
        ));
        assert_eq!(
            rejection,
            RewardRejection::CooldownActive {
                available_at: Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
            }
        );

        clock.advance(Duration::hours(1));
        credited(ledger.credit_points("u1", "review_written", Some("r2"), serde_json::json!({})));
    }

    #[test]
    fn test_cooldown_past_calendar_range_stays_active() {
        let (ledger, clock) = create_ledger();
        ledger.enroll("u1");
        credited(ledger.credit_points("u1", "host_anniversary", Some("y1"), serde_json::json!({})));

        clock.advance(Duration::days(365 * 100));
        assert_eq!(
            rejected(ledger.credit_points("u1", "host_anniversary", Some("y2"), serde_json::json!({}))),
            RewardRejection::CooldownActive {
                available_at: DateTime::<Utc>::MAX_UTC
            }
        );
    }

    #[test]
    fn test_weekly_limit_rolls_off() {
        let (ledger, clock) = create_ledger();
        ledger.enroll("u1");
        credited(ledger.credit_points("u1", "referral_signup", Some("a"), serde_json::json!({})));
        credited(ledger.credit_points("u1", "referral_signup", Some("b"), serde_json::json!({})));
        assert_eq!(
            rejected(ledger.credit_points("u1", "referral_signup", Some("c"), serde_json::json!({}))),
            RewardRejection::WeeklyLimitReached {
                max_times_per_week: 2
            }
        );

        clock.advance(Duration::days(7));
        credited(ledger.credit_points("u1", "referral_signup", Some("c"), serde_json::json!({})));
    }

    #[test]
    fn test_custom_multiplier_from_metadata() {
        let (ledger, _) = create_ledger();
        ledger.enroll("u1");
        let receipt = credited(ledger.credit_points(
            "u1",
            "booking_completed",
            Some("b1"),
            serde_json::json!({ "multiplier": "2" }),
        ));
        assert_eq!(receipt.transaction.points, 500);

        let receipt = credited(ledger.credit_points(
            "u1",
            "booking_completed",
            Some("b2"),
            serde_json::json!({ "multiplier": 1.5 }),
        ));
        assert_eq!(receipt.transaction.points, 375);
    }

    #[test]
    fn test_history_newest_first() {
        let (ledger, clock) = create_ledger();
        ledger.enroll("u1");
        ledger.enroll("u2");
        credited(ledger.credit_points("u1", "booking_completed", Some("b1"), serde_json::json!({})));
        clock.advance(Duration::hours(1));
        credited(ledger.credit_points("u2", "booking_completed", Some("b2"), serde_json::json!({})));
        credited(ledger.credit_points("u1", "booking_completed", Some("b3"), serde_json::json!({})));

        let refs: Vec<_> = ledger
            .history("u1")
            .into_iter()
            .map(|t| t.reference_id.unwrap())
            .collect();
        assert_eq!(refs, vec!["b3", "b1"]);
    }

    #[test]
    fn test_enroll_is_idempotent() {
        let (ledger, _) = create_ledger();
        ledger.enroll("u1");
        credited(ledger.credit_points("u1", "booking_completed", None, serde_json::json!({})));
        let state = ledger.enroll("u1");
        assert_eq!(state.points, 250);
        assert_eq!(state.tier.as_deref(), Some("member"));
    }
}
