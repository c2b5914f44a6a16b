//! Booking orchestration.
//!
//! Drives a request through availability, pricing, promotions and commit,
//! recording one audit step per stage. Expected refusals come back as
//! [`BookingOutcome::Rejected`]; only faults surface as `EngineError`.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::state::{BookingMachine, BookingState};
use crate::calculation::{
    AppliedPromotion, Availability, DiscountContext, DiscountDecision,
    PromotionRejection, check_availability, evaluate_promotion, price_stay,
};
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AuditStep, BookingRejection, BookingRequest, BookingStatus, ExistingReservation, Listing,
    PricedBooking, Promotion,
};
use crate::notify::{EngineEvent, Notifier};
use crate::store::{CommitError, CreditOutcome, PromotionBook, ReservationBook, RewardsLedger};

/// Everything needed to evaluate one booking.
#[derive(Debug, Clone)]
pub struct BookingSubmission {
    /// The guest's request.
    pub request: BookingRequest,
    /// Snapshot of the listing being booked.
    pub listing: Listing,
    /// Promotion codes to apply, in order.
    pub promotion_codes: Vec<String>,
    /// Whether a membership-tier discount is already in play.
    pub membership_discount: bool,
}

/// A committed booking.
#[derive(Debug, Clone, Serialize)]
pub struct AcceptedBooking {
    /// The new booking id.
    pub booking_id: Uuid,
    /// The request as accepted.
    pub request: BookingRequest,
    /// `Confirmed` for instant-bookable listings, otherwise `Pending`.
    pub status: BookingStatus,
    /// Final breakdown, discounts included.
    pub priced: PricedBooking,
    /// Promotions applied, in order.
    pub applied_promotions: Vec<AppliedPromotion>,
    /// When the booking was committed.
    pub created_at: DateTime<Utc>,
    /// One step per stage.
    pub audit_trail: Vec<AuditStep>,
}

/// The result of submitting a booking.
#[derive(Debug, Clone)]
pub enum BookingOutcome {
    /// The booking was committed.
    Accepted(Box<AcceptedBooking>),
    /// The booking was refused. Nothing was written.
    Rejected {
        /// Why.
        rejection: BookingRejection,
        /// Steps up to and including the refusal.
        audit_trail: Vec<AuditStep>,
    },
}

/// The result of completing a stay.
#[derive(Debug, Clone)]
pub struct CompletedStay {
    /// The booking completed.
    pub booking_id: Uuid,
    /// The completion reward attempt. `None` for walk-in guests.
    pub reward: Option<CreditOutcome>,
}

/// Coordinates the booking pipeline over shared stores.
pub struct BookingOrchestrator {
    config: Arc<EngineConfig>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
    reservations: ReservationBook,
    promotions: PromotionBook,
    ledger: RewardsLedger,
    accepted: Mutex<HashMap<Uuid, AcceptedBooking>>,
}

impl std::fmt::Debug for BookingOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookingOrchestrator")
            .field("reservations", &self.reservations)
            .field("promotions", &self.promotions)
            .field("ledger", &self.ledger)
            .finish_non_exhaustive()
    }
}

struct Rejection {
    rejection: BookingRejection,
    step: AuditStep,
}

fn commit_step(
    step_number: u32,
    input: serde_json::Value,
    output: serde_json::Value,
    reasoning: String,
) -> AuditStep {
    AuditStep {
        step_number,
        rule_id: "booking_commit".to_string(),
        rule_name: "Booking Commit".to_string(),
        input,
        output,
        reasoning,
    }
}

fn promotion_step(
    step_number: u32,
    input: serde_json::Value,
    rejection: &PromotionRejection,
) -> AuditStep {
    AuditStep {
        step_number,
        rule_id: "promotion_discount".to_string(),
        rule_name: "Promotion Discount".to_string(),
        input,
        output: serde_json::json!({ "applied": false, "rejection": rejection }),
        reasoning: rejection.to_string(),
    }
}

impl BookingOrchestrator {
    /// Creates an orchestrator with empty stores.
    pub fn new(
        config: Arc<EngineConfig>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let ledger = RewardsLedger::new(Arc::clone(&config), Arc::clone(&clock));
        Self {
            config,
            clock,
            notifier,
            reservations: ReservationBook::new(),
            promotions: PromotionBook::new(),
            ledger,
            accepted: Mutex::new(HashMap::new()),
        }
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The reservation calendar.
    pub fn reservations(&self) -> &ReservationBook {
        &self.reservations
    }

    /// The promotion registry.
    pub fn promotions(&self) -> &PromotionBook {
        &self.promotions
    }

    /// The rewards ledger.
    pub fn ledger(&self) -> &RewardsLedger {
        &self.ledger
    }

    /// Looks up an accepted booking.
    pub fn booking(&self, booking_id: Uuid) -> Option<AcceptedBooking> {
        self.accepted.lock().get(&booking_id).cloned()
    }

    /// Evaluates and, if everything passes, commits a booking.
    ///
    /// Stages: availability (step 1), pricing (step 2), promotions (one
    /// step each, or a pass-through step when none are supplied), commit
    /// (last step). The commit re-checks overlap under the listing lock and
    /// redeems the promotions inside it, so a refused redemption leaves no
    /// reservation behind.
    ///
    /// # Errors
    ///
    /// `ListingMismatch` when the snapshot is for another listing, and
    /// `InvalidTransition` if the pipeline is ever driven out of order.
    pub fn submit(&self, submission: BookingSubmission) -> EngineResult<BookingOutcome> {
        let BookingSubmission {
            request,
            listing,
            promotion_codes,
            membership_discount,
        } = submission;

        if request.listing_id != listing.id {
            return Err(EngineError::ListingMismatch {
                requested: request.listing_id,
                snapshot: listing.id,
            });
        }

        let mut machine = BookingMachine::new();
        let mut audit_trail = Vec::new();
        let mut step_number: u32 = 1;
        let settings = self.config.settings();
        let now = self.clock.now();

        // Draft -> Validated
        let availability = check_availability(
            &listing,
            &request.range,
            &request.party,
            &self.reservations.reservations_for(&listing.id),
            &self.reservations.blocked_for(&listing.id),
            &settings.active_statuses,
            self.clock.today(),
            step_number,
        );
        audit_trail.push(availability.audit_step);
        step_number += 1;
        if let Availability::Rejected(rejection) = availability.availability {
            machine.reject(rejection.reason())?;
            return Ok(self.rejected(&listing, rejection.to_booking_rejection(), audit_trail));
        }
        machine.advance(BookingState::Validated)?;

        // Validated -> Priced
        let pricing = price_stay(&listing, &request.range, settings, step_number);
        audit_trail.push(pricing.audit_step);
        step_number += 1;
        let mut priced = pricing.priced;
        machine.advance(BookingState::Priced)?;

        // Priced -> Discounted
        let mut codes: Vec<String> = Vec::new();
        for code in &promotion_codes {
            let normalized = Promotion::normalize_code(code);
            if !normalized.is_empty() && !codes.contains(&normalized) {
                codes.push(normalized);
            }
        }
        let applied = match self.apply_promotions(
            &request,
            &listing,
            &codes,
            membership_discount,
            &mut priced,
            now,
            &mut step_number,
            &mut audit_trail,
        ) {
            Ok(applied) => applied,
            Err(rejection) => {
                machine.reject(rejection.reason)?;
                return Ok(self.rejected(&listing, rejection, audit_trail));
            }
        };
        machine.advance(BookingState::Discounted)?;

        // Discounted -> Accepted
        let booking_id = Uuid::new_v4();
        let status = if listing.is_instant_bookable() {
            BookingStatus::Confirmed
        } else {
            BookingStatus::Pending
        };
        let reservation = ExistingReservation {
            id: booking_id,
            listing_id: listing.id.clone(),
            range: request.range,
            status: status.into(),
        };
        let redeemer = request.contact.as_ref().map(|c| c.redeemer_key());
        let commit_input = serde_json::json!({
            "booking_id": booking_id,
            "listing_id": listing.id,
            "range": request.range.to_string(),
            "promotion_codes": codes
        });

        let committed = self.reservations.commit_with(reservation, &settings.active_statuses, || {
            match (&redeemer, codes.is_empty()) {
                (_, true) => Ok(Vec::new()),
                (Some(redeemer), false) => self.promotions.redeem_all(&codes, redeemer, booking_id, now),
                (None, false) => Err(PromotionRejection::MissingRedeemer),
            }
        });

        let redemptions = match committed {
            Ok(redemptions) => redemptions,
            Err(error) => {
                let (rejection, output) = match &error {
                    CommitError::Conflict(conflict) => (
                        conflict.to_booking_rejection(),
                        serde_json::json!({ "committed": false, "conflict": conflict }),
                    ),
                    CommitError::Aborted(promotion) => (
                        promotion.to_booking_rejection(),
                        serde_json::json!({ "committed": false, "promotion": promotion }),
                    ),
                };
                audit_trail.push(commit_step(
                    step_number,
                    commit_input,
                    output,
                    rejection.message.clone(),
                ));
                machine.reject(rejection.reason)?;
                return Ok(self.rejected(&listing, rejection, audit_trail));
            }
        };

        audit_trail.push(commit_step(
            step_number,
            commit_input,
            serde_json::json!({
                "committed": true,
                "status": status,
                "redemptions": redemptions.len(),
                "total": priced.total
            }),
            format!(
                "Reserved {} at listing '{}' as {:?}",
                request.range, listing.id, status
            ),
        ));
        machine.advance(BookingState::Accepted)?;

        let booking = AcceptedBooking {
            booking_id,
            request,
            status,
            priced,
            applied_promotions: applied,
            created_at: now,
            audit_trail,
        };
        self.accepted.lock().insert(booking_id, booking.clone());

        info!(
            booking_id = %booking_id,
            listing_id = %listing.id,
            status = ?status,
            total = booking.priced.total,
            discount = booking.priced.discount,
            "Booking accepted"
        );

        self.dispatch(EngineEvent::BookingCreated {
            booking_id,
            listing_id: listing.id,
            range: booking.request.range,
            status,
            total: booking.priced.total,
        });

        Ok(BookingOutcome::Accepted(Box::new(booking)))
    }

    #[allow(clippy::too_many_arguments)]
    fn apply_promotions(
        &self,
        request: &BookingRequest,
        listing: &Listing,
        codes: &[String],
        membership_discount: bool,
        priced: &mut PricedBooking,
        now: DateTime<Utc>,
        step_number: &mut u32,
        audit_trail: &mut Vec<AuditStep>,
    ) -> Result<Vec<AppliedPromotion>, BookingRejection> {
        if codes.is_empty() {
            audit_trail.push(AuditStep {
                step_number: *step_number,
                rule_id: "promotion_discount".to_string(),
                rule_name: "Promotion Discount".to_string(),
                input: serde_json::json!({ "codes": [] }),
                output: serde_json::json!({ "applied": false, "total": priced.total }),
                reasoning: "No promotion code supplied".to_string(),
            });
            *step_number += 1;
            return Ok(Vec::new());
        }

        let redeemer = request.contact.as_ref().map(|c| c.redeemer_key());
        let mut applied: Vec<AppliedPromotion> = Vec::new();

        for code in codes {
            let outcome = self.evaluate_code(
                code,
                redeemer.as_deref(),
                listing,
                &applied,
                membership_discount,
                priced,
                now,
                *step_number,
            );
            let rejected = match outcome {
                Ok((promotion, step, amount)) => {
                    audit_trail.push(step);
                    let taken = priced.add_discount(amount);
                    applied.push(AppliedPromotion {
                        promotion_id: promotion.id,
                        code: promotion.code,
                        amount: taken,
                        stack_with_promotions: promotion.stack_with_promotions,
                    });
                    None
                }
                Err(Rejection { rejection, step }) => {
                    audit_trail.push(step);
                    Some(rejection)
                }
            };
            *step_number += 1;
            if let Some(rejection) = rejected {
                debug!(code = %code, reason = %rejection.message, "Promotion rejected");
                return Err(rejection);
            }
        }
        Ok(applied)
    }

    #[allow(clippy::too_many_arguments)]
    fn evaluate_code(
        &self,
        code: &str,
        redeemer: Option<&str>,
        listing: &Listing,
        applied: &[AppliedPromotion],
        membership_discount: bool,
        priced: &PricedBooking,
        now: DateTime<Utc>,
        step_number: u32,
    ) -> Result<(Promotion, AuditStep, i64), Rejection> {
        let input = serde_json::json!({ "code": code });
        let reject = |rejection: PromotionRejection| Rejection {
            step: promotion_step(step_number, input.clone(), &rejection),
            rejection: rejection.to_booking_rejection(),
        };

        let Some(redeemer) = redeemer else {
            return Err(reject(PromotionRejection::MissingRedeemer));
        };
        let Some(promotion) = self.promotions.get(code) else {
            return Err(reject(PromotionRejection::UnknownCode {
                code: code.to_string(),
            }));
        };

        let context = DiscountContext {
            listing,
            redeemer_uses: self.promotions.redemption_count(&promotion.id, redeemer),
            applied_promotions: applied,
            membership_discount,
        };
        let result = evaluate_promotion(&promotion, priced, &context, now, step_number);
        match result.decision {
            DiscountDecision::Applied { discount, .. } => Ok((promotion, result.audit_step, discount)),
            DiscountDecision::Rejected(rejection) => Err(Rejection {
                rejection: rejection.to_booking_rejection(),
                step: result.audit_step,
            }),
        }
    }

    fn rejected(
        &self,
        listing: &Listing,
        rejection: BookingRejection,
        audit_trail: Vec<AuditStep>,
    ) -> BookingOutcome {
        info!(
            listing_id = %listing.id,
            kind = ?rejection.kind,
            reason = ?rejection.reason,
            message = %rejection.message,
            "Booking rejected"
        );
        BookingOutcome::Rejected {
            rejection,
            audit_trail,
        }
    }

    /// Host confirmation of a pending booking.
    ///
    /// Confirming an already confirmed booking is a no-op.
    ///
    /// # Errors
    ///
    /// `BookingNotFound` for an unknown id and `BookingStatusConflict` once
    /// the stay is completed.
    pub fn confirm_booking(&self, booking_id: Uuid) -> EngineResult<AcceptedBooking> {
        let booking = self.transition(
            booking_id,
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            "confirm",
        )?;
        info!(booking_id = %booking_id, "Booking confirmed");
        Ok(booking)
    }

    /// Marks a stay completed and credits the completion reward.
    ///
    /// Only confirmed bookings can complete; a pending request must be
    /// confirmed first. The booking id is the reward's idempotency
    /// reference, so calling this again for the same booking credits nothing
    /// and reports `Duplicate`.
    pub fn complete_stay(&self, booking_id: Uuid) -> EngineResult<CompletedStay> {
        let booking = self.transition(
            booking_id,
            BookingStatus::Confirmed,
            BookingStatus::Completed,
            "complete",
        )?;

        let Some(user_id) = booking.request.contact.as_ref().and_then(|c| c.user_id()) else {
            debug!(booking_id = %booking_id, "Walk-in stay completed; no reward");
            return Ok(CompletedStay {
                booking_id,
                reward: None,
            });
        };

        let outcome = self.ledger.credit_points(
            user_id,
            &self.config.settings().completion_reward_action,
            Some(&booking_id.to_string()),
            serde_json::json!({
                "listing_id": booking.request.listing_id,
                "total": booking.priced.total
            }),
        );

        match &outcome {
            CreditOutcome::Credited(receipt) => self.dispatch(EngineEvent::RewardEarned {
                user_id: user_id.to_string(),
                action_slug: receipt.transaction.action_slug.clone(),
                points: receipt.transaction.points,
                balance_after: receipt.transaction.balance_after,
                upgraded_to: receipt
                    .tier_upgraded
                    .then(|| receipt.new_tier.clone())
                    .flatten(),
            }),
            CreditOutcome::Rejected(rejection) => {
                info!(booking_id = %booking_id, %user_id, %rejection, "Completion reward not credited");
            }
        }

        Ok(CompletedStay {
            booking_id,
            reward: Some(outcome),
        })
    }

    /// Moves a booking from `from` to `to` in both the booking cache and the
    /// listing calendar. A booking already at `to` is returned unchanged.
    fn transition(
        &self,
        booking_id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
        action: &str,
    ) -> EngineResult<AcceptedBooking> {
        let mut accepted = self.accepted.lock();
        let booking = accepted
            .get_mut(&booking_id)
            .ok_or(EngineError::BookingNotFound { booking_id })?;
        if booking.status == to {
            return Ok(booking.clone());
        }
        if booking.status != from {
            return Err(EngineError::BookingStatusConflict {
                booking_id,
                status: booking.status.to_string(),
                action: action.to_string(),
            });
        }
        self.reservations.update_status(booking_id, to.into())?;
        booking.status = to;
        Ok(booking.clone())
    }

    fn dispatch(&self, event: EngineEvent) {
        if let Err(err) = self.notifier.notify(&event) {
            warn!(error = %err, event = ?event, "Notification dispatch failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::config::EngineSettings;
    use crate::models::{
        BookingMode, ContactIdentity, DateRange, DiscountType, PartyComposition, RejectionKind,
        RejectionReason, ReservationStatus, RewardAction, TierDefinition,
    };
    use crate::notify::NotifyError;
    use crate::store::RewardRejection;
    use chrono::{NaiveDate, TimeZone};
    use rust_decimal::Decimal;

    #[derive(Default)]
    struct RecordingNotifier {
        events: Mutex<Vec<EngineEvent>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, event: &EngineEvent) -> Result<(), NotifyError> {
            self.events.lock().push(event.clone());
            Ok(())
        }
    }

    struct FailingNotifier;

    impl Notifier for FailingNotifier {
        fn notify(&self, _event: &EngineEvent) -> Result<(), NotifyError> {
            Err(NotifyError {
                message: "smtp unreachable".to_string(),
            })
        }
    }

    fn create_test_config() -> Arc<EngineConfig> {
        Arc::new(EngineConfig::new(
            EngineSettings::default(),
            vec![
                TierDefinition {
                    slug: "member".to_string(),
                    name: "Member".to_string(),
                    min_points: 0,
                    multiplier: Decimal::ONE,
                },
                TierDefinition {
                    slug: "gold".to_string(),
                    name: "Gold".to_string(),
                    min_points: 5_000,
                    multiplier: Decimal::new(12, 1),
                },
            ],
            vec![RewardAction {
                slug: "booking_completed".to_string(),
                name: "Booking completed".to_string(),
                points_base: 250,
                cooldown_hours: None,
                max_times_per_week: None,
                is_recurring: true,
                is_active: true,
            }],
        ))
    }

    fn create_orchestrator(notifier: Arc<dyn Notifier>) -> BookingOrchestrator {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
        ));
        BookingOrchestrator::new(create_test_config(), clock, notifier)
    }

    fn create_test_listing(booking_mode: BookingMode) -> Listing {
        Listing {
            id: "lst_001".to_string(),
            property_type: "villa".to_string(),
            max_guests: 4,
            allows_pets: false,
            base_price: 1_000_000,
            cleaning_fee: 200_000,
            booking_mode,
            is_active: true,
        }
    }

    fn range(start_day: u32, end_day: u32) -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2026, 3, start_day).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, end_day).unwrap(),
        )
        .unwrap()
    }

    fn submission(range: DateRange, codes: &[&str]) -> BookingSubmission {
        BookingSubmission {
            request: BookingRequest {
                listing_id: "lst_001".to_string(),
                range,
                party: PartyComposition {
                    adults: 2,
                    ..PartyComposition::default()
                },
                contact: Some(ContactIdentity::Registered {
                    user_id: "u1".to_string(),
                }),
            },
            listing: create_test_listing(BookingMode::Instant),
            promotion_codes: codes.iter().map(|c| c.to_string()).collect(),
            membership_discount: false,
        }
    }

    fn summer_promotion() -> Promotion {
        Promotion {
            id: "promo_summer".to_string(),
            code: "SUMMER15".to_string(),
            discount_type: DiscountType::Percentage,
            discount_value: Decimal::new(15, 0),
            max_discount: Some(300_000),
            min_booking_value: None,
            max_uses: None,
            max_uses_per_user: None,
            used_count: 0,
            valid_from: None,
            valid_until: None,
            property_types: vec![],
            listing_ids: vec![],
            stack_with_membership: false,
            stack_with_promotions: false,
            is_active: true,
        }
    }

    fn accepted(outcome: BookingOutcome) -> AcceptedBooking {
        match outcome {
            BookingOutcome::Accepted(booking) => *booking,
            BookingOutcome::Rejected { rejection, .. } => {
                panic!("Expected acceptance, got {:?}", rejection)
            }
        }
    }

    fn rejected(outcome: BookingOutcome) -> (BookingRejection, Vec<AuditStep>) {
        match outcome {
            BookingOutcome::Rejected {
                rejection,
                audit_trail,
            } => (rejection, audit_trail),
            BookingOutcome::Accepted(booking) => {
                panic!("Expected rejection, got {:?}", booking.booking_id)
            }
        }
    }

    /// OR-001: three nights with a capped 15% code
    #[test]
    fn test_capped_percentage_booking() {
        let orchestrator = create_orchestrator(Arc::new(RecordingNotifier::default()));
        orchestrator.promotions().insert(summer_promotion()).unwrap();

        let booking = accepted(
            orchestrator
                .submit(submission(range(10, 13), &["summer15"]))
                .unwrap(),
        );

        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.priced.base_price_total, 3_000_000);
        assert_eq!(booking.priced.service_fee, 150_000);
        assert_eq!(booking.priced.discount, 300_000);
        assert_eq!(booking.priced.total, 3_050_000);
        assert_eq!(booking.applied_promotions.len(), 1);

        let rule_ids: Vec<_> = booking.audit_trail.iter().map(|s| s.rule_id.as_str()).collect();
        assert_eq!(
            rule_ids,
            vec!["availability_check", "stay_pricing", "promotion_discount", "booking_commit"]
        );
        assert_eq!(orchestrator.promotions().get("SUMMER15").unwrap().used_count, 1);
    }

    /// OR-002: request-to-book listings start pending
    #[test]
    fn test_request_mode_is_pending() {
        let orchestrator = create_orchestrator(Arc::new(RecordingNotifier::default()));
        let mut sub = submission(range(10, 13), &[]);
        sub.listing.booking_mode = BookingMode::Request;

        let booking = accepted(orchestrator.submit(sub).unwrap());
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(
            orchestrator.reservations().find(booking.booking_id).unwrap().status,
            ReservationStatus::Pending
        );
    }

    /// OR-007: a listing snapshot with a negative rate never reaches pricing
    #[test]
    fn test_negative_base_price_rejected_before_pricing() {
        let orchestrator = create_orchestrator(Arc::new(RecordingNotifier::default()));
        let mut sub = submission(range(10, 13), &[]);
        sub.listing.base_price = -1_000_000;

        let (rejection, audit_trail) = rejected(orchestrator.submit(sub).unwrap());
        assert_eq!(rejection.kind, RejectionKind::Validation);
        assert_eq!(rejection.reason, RejectionReason::Invalid);
        assert!(rejection.message.contains("base_price"));
        assert_eq!(audit_trail.len(), 1);
        assert!(orchestrator.reservations().reservations_for("lst_001").is_empty());
    }

    /// OR-008: negative cleaning fee, zero capacity and overflowing price are rejected
    #[test]
    fn test_unpriceable_listings_rejected() {
        let orchestrator = create_orchestrator(Arc::new(RecordingNotifier::default()));
        let mutations: [fn(&mut Listing); 3] = [
            |l| l.cleaning_fee = -200_000,
            |l| l.max_guests = 0,
            |l| l.base_price = i64::MAX / 2,
        ];
        for mutate in mutations {
            let mut sub = submission(range(10, 13), &[]);
            mutate(&mut sub.listing);
            let (rejection, _) = rejected(orchestrator.submit(sub).unwrap());
            assert_eq!(rejection.kind, RejectionKind::Validation);
        }
        assert!(orchestrator.reservations().reservations_for("lst_001").is_empty());
    }

    /// OR-009: an overflowing party size is a capacity rejection
    #[test]
    fn test_overflowing_party_rejected() {
        let orchestrator = create_orchestrator(Arc::new(RecordingNotifier::default()));
        let mut sub = submission(range(10, 13), &[]);
        sub.request.party = PartyComposition {
            adults: u32::MAX,
            children: 1,
            ..PartyComposition::default()
        };

        let (rejection, _) = rejected(orchestrator.submit(sub).unwrap());
        assert_eq!(rejection.kind, RejectionKind::Conflict);
        assert_eq!(rejection.reason, RejectionReason::Capacity);
    }

    /// OR-003: overlapping second booking conflicts with the first
    #[test]
    fn test_second_overlapping_booking_conflicts() {
        let orchestrator = create_orchestrator(Arc::new(RecordingNotifier::default()));
        accepted(orchestrator.submit(submission(range(10, 13), &[])).unwrap());

        let (rejection, trail) = rejected(orchestrator.submit(submission(range(12, 15), &[])).unwrap());
        assert_eq!(rejection.kind, RejectionKind::Conflict);
        assert_eq!(rejection.reason, RejectionReason::Unavailable);
        assert_eq!(rejection.conflicting_range, Some(range(10, 13)));
        assert_eq!(trail.len(), 1);

        // Touching ranges do not conflict.
        accepted(orchestrator.submit(submission(range(13, 15), &[])).unwrap());
    }

    /// OR-004: an ineligible code rejects without writing anything
    #[test]
    fn test_ineligible_code_leaves_no_state() {
        let orchestrator = create_orchestrator(Arc::new(RecordingNotifier::default()));
        let mut promotion = summer_promotion();
        promotion.min_booking_value = Some(10_000_000);
        orchestrator.promotions().insert(promotion).unwrap();

        let (rejection, trail) =
            rejected(orchestrator.submit(submission(range(10, 13), &["SUMMER15"])).unwrap());
        assert_eq!(rejection.kind, RejectionKind::PromotionIneligible);
        assert_eq!(trail.len(), 3);
        assert!(orchestrator.reservations().reservations_for("lst_001").is_empty());
        assert_eq!(orchestrator.promotions().get("SUMMER15").unwrap().used_count, 0);

        // Retrying without the code succeeds.
        accepted(orchestrator.submit(submission(range(10, 13), &[])).unwrap());
    }

    #[test]
    fn test_unknown_code_rejected() {
        let orchestrator = create_orchestrator(Arc::new(RecordingNotifier::default()));
        let (rejection, _) =
            rejected(orchestrator.submit(submission(range(10, 13), &["NOPE"])).unwrap());
        assert_eq!(rejection.reason, RejectionReason::PromotionIneligible);
        assert!(rejection.message.contains("NOPE"));
    }

    #[test]
    fn test_code_without_contact_rejected() {
        let orchestrator = create_orchestrator(Arc::new(RecordingNotifier::default()));
        orchestrator.promotions().insert(summer_promotion()).unwrap();
        let mut sub = submission(range(10, 13), &["SUMMER15"]);
        sub.request.contact = None;

        let (rejection, _) = rejected(orchestrator.submit(sub).unwrap());
        assert_eq!(rejection.kind, RejectionKind::PromotionIneligible);
    }

    #[test]
    fn test_stacked_codes() {
        let orchestrator = create_orchestrator(Arc::new(RecordingNotifier::default()));
        let mut first = summer_promotion();
        first.stack_with_promotions = true;
        orchestrator.promotions().insert(first).unwrap();
        let mut second = summer_promotion();
        second.id = "promo_fixed".to_string();
        second.code = "FIXED100K".to_string();
        second.discount_type = DiscountType::FixedAmount;
        second.discount_value = Decimal::new(100_000, 0);
        second.max_discount = None;
        orchestrator.promotions().insert(second).unwrap();

        let booking = accepted(
            orchestrator
                .submit(submission(range(10, 13), &["SUMMER15", "FIXED100K"]))
                .unwrap(),
        );
        assert_eq!(booking.priced.discount, 400_000);
        assert_eq!(booking.priced.total, 2_950_000);
        assert_eq!(booking.audit_trail.len(), 5);
    }

    #[test]
    fn test_listing_mismatch_is_an_error() {
        let orchestrator = create_orchestrator(Arc::new(RecordingNotifier::default()));
        let mut sub = submission(range(10, 13), &[]);
        sub.listing.id = "lst_999".to_string();
        assert!(matches!(
            orchestrator.submit(sub),
            Err(EngineError::ListingMismatch { .. })
        ));
    }

    #[test]
    fn test_past_check_in_is_validation() {
        let orchestrator = create_orchestrator(Arc::new(RecordingNotifier::default()));
        let past = DateRange::new(
            NaiveDate::from_ymd_opt(2026, 2, 27).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
        )
        .unwrap();
        let (rejection, _) = rejected(orchestrator.submit(submission(past, &[])).unwrap());
        assert_eq!(rejection.kind, RejectionKind::Validation);
        assert_eq!(rejection.reason, RejectionReason::PastDate);
    }

    /// OR-005: notification failure does not roll back the booking
    #[test]
    fn test_notifier_failure_keeps_booking() {
        let orchestrator = create_orchestrator(Arc::new(FailingNotifier));
        let booking = accepted(orchestrator.submit(submission(range(10, 13), &[])).unwrap());
        assert!(orchestrator.booking(booking.booking_id).is_some());
        assert_eq!(orchestrator.reservations().reservations_for("lst_001").len(), 1);
    }

    /// OR-006: completing a stay credits once per booking
    #[test]
    fn test_complete_stay_credits_once() {
        let notifier = Arc::new(RecordingNotifier::default());
        let orchestrator = create_orchestrator(notifier.clone());
        orchestrator.ledger().enroll("u1");
        let booking = accepted(orchestrator.submit(submission(range(10, 13), &[])).unwrap());

        let completed = orchestrator.complete_stay(booking.booking_id).unwrap();
        match completed.reward {
            Some(CreditOutcome::Credited(receipt)) => {
                assert_eq!(receipt.transaction.points, 250);
                assert_eq!(
                    receipt.transaction.reference_id,
                    Some(booking.booking_id.to_string())
                );
            }
            other => panic!("Expected credit, got {:?}", other),
        }
        assert_eq!(
            orchestrator.reservations().find(booking.booking_id).unwrap().status,
            ReservationStatus::Completed
        );
        assert_eq!(
            orchestrator.booking(booking.booking_id).unwrap().status,
            BookingStatus::Completed
        );

        let again = orchestrator.complete_stay(booking.booking_id).unwrap();
        assert!(matches!(
            again.reward,
            Some(CreditOutcome::Rejected(RewardRejection::Duplicate { .. }))
        ));
        assert_eq!(orchestrator.ledger().state("u1").unwrap().points, 250);

        let events = notifier.events.lock();
        assert!(matches!(events[0], EngineEvent::BookingCreated { .. }));
        assert!(matches!(events[1], EngineEvent::RewardEarned { points: 250, .. }));
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_complete_unknown_booking() {
        let orchestrator = create_orchestrator(Arc::new(RecordingNotifier::default()));
        assert!(matches!(
            orchestrator.complete_stay(Uuid::new_v4()),
            Err(EngineError::BookingNotFound { .. })
        ));
    }

    #[test]
    fn test_walk_in_completion_earns_nothing() {
        let orchestrator = create_orchestrator(Arc::new(RecordingNotifier::default()));
        let mut sub = submission(range(10, 13), &[]);
        sub.request.contact = Some(ContactIdentity::WalkIn {
            name: "Lan".to_string(),
            email: "lan@example.com".to_string(),
            phone: "+84900000000".to_string(),
        });
        let booking = accepted(orchestrator.submit(sub).unwrap());
        let completed = orchestrator.complete_stay(booking.booking_id).unwrap();
        assert!(completed.reward.is_none());
    }

    /// OR-010: a pending request must be confirmed before it can complete
    #[test]
    fn test_pending_booking_completes_only_after_confirmation() {
        let orchestrator = create_orchestrator(Arc::new(RecordingNotifier::default()));
        orchestrator.ledger().enroll("u1");
        let mut sub = submission(range(10, 13), &[]);
        sub.listing.booking_mode = BookingMode::Request;
        let booking = accepted(orchestrator.submit(sub).unwrap());

        match orchestrator.complete_stay(booking.booking_id) {
            Err(EngineError::BookingStatusConflict { status, action, .. }) => {
                assert_eq!(status, "PENDING");
                assert_eq!(action, "complete");
            }
            other => panic!("Expected status conflict, got {:?}", other),
        }
        assert_eq!(
            orchestrator.reservations().find(booking.booking_id).unwrap().status,
            ReservationStatus::Pending
        );
        assert_eq!(orchestrator.ledger().state("u1").unwrap().points, 0);

        let confirmed = orchestrator.confirm_booking(booking.booking_id).unwrap();
        assert_eq!(confirmed.status, BookingStatus::Confirmed);
        assert_eq!(
            orchestrator.reservations().find(booking.booking_id).unwrap().status,
            ReservationStatus::Confirmed
        );

        let completed = orchestrator.complete_stay(booking.booking_id).unwrap();
        assert!(matches!(completed.reward, Some(CreditOutcome::Credited(_))));
        assert_eq!(
            orchestrator.booking(booking.booking_id).unwrap().status,
            BookingStatus::Completed
        );
    }

    #[test]
    fn test_confirm_is_idempotent_but_not_after_completion() {
        let orchestrator = create_orchestrator(Arc::new(RecordingNotifier::default()));
        let booking = accepted(orchestrator.submit(submission(range(10, 13), &[])).unwrap());

        let confirmed = orchestrator.confirm_booking(booking.booking_id).unwrap();
        assert_eq!(confirmed.status, BookingStatus::Confirmed);

        orchestrator.complete_stay(booking.booking_id).unwrap();
        assert!(matches!(
            orchestrator.confirm_booking(booking.booking_id),
            Err(EngineError::BookingStatusConflict { .. })
        ));
        assert!(matches!(
            orchestrator.confirm_booking(Uuid::new_v4()),
            Err(EngineError::BookingNotFound { .. })
        ));
    }
}
