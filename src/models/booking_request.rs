//! Booking request model.
//!
//! A [`BookingRequest`] is built from external input, validated once by the
//! orchestrator, and never mutated afterwards.

use serde::{Deserialize, Serialize};

use super::DateRange;

/// Who is travelling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyComposition {
    /// Number of adults.
    pub adults: u32,
    /// Number of children.
    #[serde(default)]
    pub children: u32,
    /// Number of infants. Infants count towards capacity.
    #[serde(default)]
    pub infants: u32,
    /// Number of pets. Pets do not count towards capacity.
    #[serde(default)]
    pub pets: u32,
}

impl PartyComposition {
    /// Total number of guests counted against listing capacity.
    ///
    /// Saturates at `u32::MAX`, which no listing can hold.
    pub fn total_guests(&self) -> u32 {
        self.adults
            .saturating_add(self.children)
            .saturating_add(self.infants)
    }
}

/// The identity a booking is made under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContactIdentity {
    /// A registered marketplace user.
    Registered {
        /// The user's id.
        user_id: String,
    },
    /// A walk-in guest identified by contact details only.
    WalkIn {
        /// Guest name.
        name: String,
        /// Guest email address.
        email: String,
        /// Guest phone number.
        phone: String,
    },
}

impl ContactIdentity {
    /// Stable key used to count promotion redemptions per person.
    ///
    /// Walk-in guests are keyed by their email address, compared without
    /// regard to case.
    ///
    /// # Example
    ///
    /// ```
    /// use stay_engine::models::ContactIdentity;
    ///
    /// let walk_in = ContactIdentity::WalkIn {
    ///     name: "Lan".to_string(),
    ///     email: "Lan@Example.com".to_string(),
    ///     phone: "+84 90 000 0000".to_string(),
    /// };
    /// assert_eq!(walk_in.redeemer_key(), "contact:lan@example.com");
    /// ```
    pub fn redeemer_key(&self) -> String {
        match self {
            ContactIdentity::Registered { user_id } => format!("user:{}", user_id),
            ContactIdentity::WalkIn { email, .. } => {
                format!("contact:{}", email.trim().to_lowercase())
            }
        }
    }

    /// The registered user id, if any.
    pub fn user_id(&self) -> Option<&str> {
        match self {
            ContactIdentity::Registered { user_id } => Some(user_id),
            ContactIdentity::WalkIn { .. } => None,
        }
    }
}

/// A request to book a listing for a range of nights.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    /// The listing being booked.
    pub listing_id: String,
    /// Requested nights.
    pub range: DateRange,
    /// Party travelling.
    pub party: PartyComposition,
    /// Who is booking. Required when a promotion code is supplied.
    #[serde(default)]
    pub contact: Option<ContactIdentity>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_guests_excludes_pets() {
        let party = PartyComposition {
            adults: 2,
            children: 1,
            infants: 1,
            pets: 2,
        };
        assert_eq!(party.total_guests(), 4);
    }

    #[test]
    fn test_total_guests_saturates() {
        let party = PartyComposition {
            adults: u32::MAX,
            children: 1,
            infants: 1,
            pets: 0,
        };
        assert_eq!(party.total_guests(), u32::MAX);
    }

    #[test]
    fn test_registered_redeemer_key() {
        let contact = ContactIdentity::Registered {
            user_id: "usr_42".to_string(),
        };
        assert_eq!(contact.redeemer_key(), "user:usr_42");
        assert_eq!(contact.user_id(), Some("usr_42"));
    }

    #[test]
    fn test_walk_in_has_no_user_id() {
        let contact = ContactIdentity::WalkIn {
            name: "Minh".to_string(),
            email: " minh@example.com ".to_string(),
            phone: "0900000000".to_string(),
        };
        assert_eq!(contact.user_id(), None);
        assert_eq!(contact.redeemer_key(), "contact:minh@example.com");
    }

    #[test]
    fn test_deserialize_request_with_walk_in_contact() {
        let json = r#"{
            "listing_id": "lst_001",
            "range": {"start": "2026-03-10", "end": "2026-03-13"},
            "party": {"adults": 2},
            "contact": {
                "type": "walk_in",
                "name": "Minh",
                "email": "minh@example.com",
                "phone": "0900000000"
            }
        }"#;

        let request: BookingRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.range.nights(), 3);
        assert_eq!(request.party.children, 0);
        assert!(matches!(
            request.contact,
            Some(ContactIdentity::WalkIn { .. })
        ));
    }
}
