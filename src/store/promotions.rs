//! Promotion registry with atomic redemption.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::calculation::PromotionRejection;
use crate::error::{EngineError, EngineResult};
use crate::models::Promotion;

/// A recorded redemption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Redemption {
    /// The promotion redeemed.
    pub promotion_id: String,
    /// Its normalized code.
    pub code: String,
    /// Who redeemed it (see `ContactIdentity::redeemer_key`).
    pub redeemer: String,
    /// The booking it was redeemed for.
    pub booking_id: Uuid,
    /// When it was redeemed.
    pub redeemed_at: DateTime<Utc>,
    /// The promotion's `used_count` after this redemption.
    pub used_count: u32,
}

#[derive(Debug, Default)]
struct PromotionBookState {
    by_code: HashMap<String, Promotion>,
    redemption_keys: HashSet<(String, String, Uuid)>,
    per_redeemer: HashMap<(String, String), u32>,
    redemptions: Vec<Redemption>,
}

/// Promotions indexed by normalized code.
///
/// All state sits behind one lock so a redemption's re-check, counter
/// increment and record are a single step.
#[derive(Debug, Default)]
pub struct PromotionBook {
    state: Mutex<PromotionBookState>,
}

impl PromotionBook {
    /// Creates an empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a promotion. The stored code is normalized.
    pub fn insert(&self, mut promotion: Promotion) -> EngineResult<()> {
        let code = Promotion::normalize_code(&promotion.code);
        let mut state = self.state.lock();
        if state.by_code.contains_key(&code) {
            return Err(EngineError::DuplicatePromotionCode { code });
        }
        promotion.code = code.clone();
        state.by_code.insert(code, promotion);
        Ok(())
    }

    /// Looks up a promotion by code, ignoring case and surrounding spaces.
    pub fn get(&self, code: &str) -> Option<Promotion> {
        self.state
            .lock()
            .by_code
            .get(&Promotion::normalize_code(code))
            .cloned()
    }

    /// Deactivates a promotion. Returns false when the code is unknown.
    pub fn deactivate(&self, code: &str) -> bool {
        let mut state = self.state.lock();
        match state.by_code.get_mut(&Promotion::normalize_code(code)) {
            Some(promotion) => {
                promotion.is_active = false;
                true
            }
            None => false,
        }
    }

    /// Times `redeemer` has redeemed the promotion.
    pub fn redemption_count(&self, promotion_id: &str, redeemer: &str) -> u32 {
        self.state
            .lock()
            .per_redeemer
            .get(&(promotion_id.to_string(), redeemer.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// All redemptions recorded so far, oldest first.
    pub fn redemptions(&self) -> Vec<Redemption> {
        self.state.lock().redemptions.clone()
    }

    /// Redeems a promotion for a booking.
    ///
    /// Re-checks activity, the validity window and both usage caps under the
    /// lock, then increments `used_count` and records the redemption keyed by
    /// `(promotion_id, redeemer, booking_id)`. Nothing changes on rejection.
    pub fn redeem(
        &self,
        code: &str,
        redeemer: &str,
        booking_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Redemption, PromotionRejection> {
        let mut state = self.state.lock();
        state.check(code, redeemer, booking_id, now)?;
        state.record(code, redeemer, booking_id, now)
    }

    /// Redeems several promotions for one booking, all or none.
    ///
    /// Every code is checked before any counter moves. Codes are expected to
    /// be distinct.
    pub fn redeem_all(
        &self,
        codes: &[String],
        redeemer: &str,
        booking_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<Redemption>, PromotionRejection> {
        let mut state = self.state.lock();
        for code in codes {
            state.check(code, redeemer, booking_id, now)?;
        }
        codes
            .iter()
            .map(|code| state.record(code, redeemer, booking_id, now))
            .collect()
    }
}

impl PromotionBookState {
    fn check(
        &self,
        code: &str,
        redeemer: &str,
        booking_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(), PromotionRejection> {
        let promotion = self
            .by_code
            .get(&Promotion::normalize_code(code))
            .ok_or_else(|| PromotionRejection::UnknownCode {
                code: code.to_string(),
            })?;

        if !promotion.is_active {
            return Err(PromotionRejection::Inactive);
        }
        if let Some(valid_from) = promotion.valid_from.filter(|from| now < *from) {
            return Err(PromotionRejection::NotYetValid { valid_from });
        }
        if let Some(valid_until) = promotion.valid_until.filter(|until| now >= *until) {
            return Err(PromotionRejection::Expired { valid_until });
        }
        let key = (promotion.id.clone(), redeemer.to_string(), booking_id);
        if self.redemption_keys.contains(&key) {
            return Err(PromotionRejection::AlreadyRedeemed);
        }
        if let Some(max) = promotion.max_uses.filter(|max| promotion.used_count >= *max) {
            return Err(PromotionRejection::UsageExhausted {
                used: promotion.used_count,
                max,
            });
        }
        let used_by_redeemer = self
            .per_redeemer
            .get(&(promotion.id.clone(), redeemer.to_string()))
            .copied()
            .unwrap_or(0);
        if let Some(max) = promotion
            .max_uses_per_user
            .filter(|max| used_by_redeemer >= *max)
        {
            return Err(PromotionRejection::UserLimitReached {
                used: used_by_redeemer,
                max,
            });
        }
        Ok(())
    }

    fn record(
        &mut self,
        code: &str,
        redeemer: &str,
        booking_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Redemption, PromotionRejection> {
        let normalized = Promotion::normalize_code(code);
        let promotion =
            self.by_code
                .get_mut(&normalized)
                .ok_or_else(|| PromotionRejection::UnknownCode {
                    code: code.to_string(),
                })?;

        promotion.used_count += 1;
        let redemption = Redemption {
            promotion_id: promotion.id.clone(),
            code: normalized,
            redeemer: redeemer.to_string(),
            booking_id,
            redeemed_at: now,
            used_count: promotion.used_count,
        };
        self.redemption_keys.insert((
            redemption.promotion_id.clone(),
            redemption.redeemer.clone(),
            booking_id,
        ));
        *self
            .per_redeemer
            .entry((redemption.promotion_id.clone(), redemption.redeemer.clone()))
            .or_insert(0) += 1;
        self.redemptions.push(redemption.clone());

        debug!(
            code = %redemption.code,
            redeemer = %redemption.redeemer,
            booking_id = %booking_id,
            used_count = redemption.used_count,
            "Promotion redeemed"
        );
        Ok(redemption)
    }
}
