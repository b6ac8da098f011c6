use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Closed set of order states. The happy path is linear; `cancelled` is
/// reachable from every non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    Delivering,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Delivering => "delivering",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Position on the linear fulfilment path. `cancelled` carries the rank
    /// of the last linear state so stage comparisons stay total.
    fn stage(self) -> u8 {
        match self {
            OrderStatus::Pending => 0,
            OrderStatus::Confirmed => 1,
            OrderStatus::Preparing => 2,
            OrderStatus::Ready => 3,
            OrderStatus::Delivering => 4,
            OrderStatus::Delivered | OrderStatus::Cancelled => 5,
        }
    }

    /// The transition table. Anything not listed here is illegal.
    pub fn can_transition(self, to: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, to) {
            (Pending, Confirmed)
            | (Confirmed, Preparing)
            | (Preparing, Ready)
            | (Ready, Delivering)
            | (Delivering, Delivered) => true,
            (from, Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown value: {}", self.0)
    }
}

impl std::error::Error for UnknownVariant {}

impl FromStr for OrderStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "preparing" => Ok(OrderStatus::Preparing),
            "ready" => Ok(OrderStatus::Ready),
            "delivering" => Ok(OrderStatus::Delivering),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

macro_rules! string_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(UnknownVariant(other.to_string())),
                }
            }
        }
    };
}

string_enum!(CancelledBy {
    Customer => "customer",
    Chef => "chef",
    Admin => "admin",
});

string_enum!(PaymentMethod {
    Card => "card",
    Cash => "cash",
    Wallet => "wallet",
});

string_enum!(PaymentStatus {
    Pending => "pending",
    Paid => "paid",
    Failed => "failed",
    Refunded => "refunded",
});

string_enum!(RefundStatus {
    Pending => "pending",
    Processed => "processed",
    Failed => "failed",
});

/// Refund rule applied when an order is cancelled. The default refunds the
/// full total while the vendor has not started preparing, and nothing after.
#[derive(Debug, Clone, Copy)]
pub struct RefundPolicy {
    pub full_refund_before: OrderStatus,
}

impl Default for RefundPolicy {
    fn default() -> Self {
        Self {
            full_refund_before: OrderStatus::Preparing,
        }
    }
}

impl RefundPolicy {
    pub fn refund_amount(&self, status_at_cancel: OrderStatus, total: i64) -> i64 {
        if status_at_cancel.stage() < self.full_refund_before.stage() {
            total
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::OrderStatus::*;
    use super::*;

    const ALL: [OrderStatus; 7] = [
        Pending, Confirmed, Preparing, Ready, Delivering, Delivered, Cancelled,
    ];

    #[test]
    fn happy_path_is_allowed() {
        let path = [Pending, Confirmed, Preparing, Ready, Delivering, Delivered];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn cancel_allowed_from_every_non_terminal_state() {
        for from in ALL {
            assert_eq!(from.can_transition(Cancelled), !from.is_terminal());
        }
    }

    #[test]
    fn terminal_states_have_no_exits() {
        for from in [Delivered, Cancelled] {
            for to in ALL {
                assert!(!from.can_transition(to), "{} -> {}", from, to);
            }
        }
    }

    #[test]
    fn skipping_ahead_is_rejected() {
        assert!(!Pending.can_transition(Delivering));
        assert!(!Pending.can_transition(Delivered));
        assert!(!Confirmed.can_transition(Ready));
        assert!(!Preparing.can_transition(Delivered));
    }

    #[test]
    fn going_backwards_is_rejected() {
        assert!(!Confirmed.can_transition(Pending));
        assert!(!Delivering.can_transition(Ready));
        for s in ALL {
            assert!(!s.can_transition(s), "{} -> itself", s);
        }
    }

    #[test]
    fn refund_policy_full_before_preparing() {
        let policy = RefundPolicy::default();
        assert_eq!(policy.refund_amount(Pending, 3159), 3159);
        assert_eq!(policy.refund_amount(Confirmed, 3159), 3159);
        assert_eq!(policy.refund_amount(Preparing, 3159), 0);
        assert_eq!(policy.refund_amount(Ready, 3159), 0);
        assert_eq!(policy.refund_amount(Delivering, 3159), 0);
    }

    #[test]
    fn status_round_trips_through_strings() {
        for s in ALL {
            assert_eq!(s.as_str().parse::<OrderStatus>().unwrap(), s);
        }
        assert!("shipped".parse::<OrderStatus>().is_err());
    }
}
