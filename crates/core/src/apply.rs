// Copyright (C) 2026 Caissa Chess Club
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::command::Command;
use crate::error::CoreError;
use crate::state::{SubscriptionState, TransitionResult};
use caissa_domain::{
    DomainError, Enrollment, EnrollmentStatus, Order, PaymentStatus, SubscriptionStatus,
};
use time::Date;

/// Applies a command to the current aggregate state, producing a new state.
///
/// The input state is immutable; callers persist the returned state. `today`
/// supplies the clock for date-defaulting so the function stays pure.
///
/// # Errors
///
/// Returns an error if:
/// - The command would violate a capacity limit
/// - The command requests a forbidden payment-status transition
/// - The command references an enrollment or order id not in the aggregate
/// - The subscription has no canonical id yet
#[allow(clippy::too_many_lines)]
pub fn apply(
    state: &SubscriptionState,
    command: Command,
    today: Date,
) -> Result<TransitionResult, CoreError> {
    match command {
        Command::CreateEnrollment {
            child_id,
            workshop_id,
        } => {
            let subscription_id: i64 = state
                .subscription
                .subscription_id
                .ok_or(CoreError::UnpersistedSubscription)?;

            // Global plan limit, checked before the per-child limit.
            let total_limit: u32 = state.plan.total_enrollment_limit();
            if state.active_enrollment_count() >= total_limit {
                return Err(CoreError::DomainViolation(
                    DomainError::PlanCapacityExceeded { limit: total_limit },
                ));
            }

            // Per-child workshop limit.
            let child_limit: u32 = state.plan.max_workshops_per_child;
            if state.active_enrollment_count_for_child(child_id) >= child_limit {
                return Err(CoreError::DomainViolation(
                    DomainError::ChildWorkshopLimitExceeded { limit: child_limit },
                ));
            }

            let mut new_state: SubscriptionState = state.clone();
            new_state
                .enrollments
                .push(Enrollment::new_active(subscription_id, child_id, workshop_id));
            Ok(TransitionResult { new_state })
        }
        Command::MoveEnrollment {
            enrollment_id,
            new_workshop_id,
        } => {
            let mut new_state: SubscriptionState = state.clone();
            let source: &mut Enrollment = new_state
                .enrollments
                .iter_mut()
                .find(|e| e.enrollment_id == Some(enrollment_id))
                .ok_or(CoreError::EnrollmentNotFound(enrollment_id))?;

            // History-preserving: close the old row, open a new one. The
            // active count is unchanged, so capacity is not re-checked.
            source.status = EnrollmentStatus::Changed;
            let replacement: Enrollment =
                Enrollment::new_active(source.subscription_id, source.child_id, new_workshop_id);
            new_state.enrollments.push(replacement);
            Ok(TransitionResult { new_state })
        }
        Command::CancelEnrollment { enrollment_id } => {
            let mut new_state: SubscriptionState = state.clone();
            let enrollment: &mut Enrollment = new_state
                .enrollments
                .iter_mut()
                .find(|e| e.enrollment_id == Some(enrollment_id))
                .ok_or(CoreError::EnrollmentNotFound(enrollment_id))?;
            enrollment.status = EnrollmentStatus::Canceled;
            Ok(TransitionResult { new_state })
        }
        Command::ActivateSubscription => {
            let mut new_state: SubscriptionState = state.clone();
            new_state.subscription.status = SubscriptionStatus::Active;
            new_state.subscription.end_date = None;
            Ok(TransitionResult { new_state })
        }
        Command::CancelSubscription {
            cancel_enrollments,
            end_date,
        } => {
            let mut new_state: SubscriptionState = state.clone();
            new_state.subscription.status = SubscriptionStatus::Canceled;
            new_state.subscription.end_date = Some(end_date.unwrap_or(today));

            if cancel_enrollments {
                // Only currently-active rows; `changed` and `canceled` rows
                // are already terminal and stay untouched.
                for enrollment in &mut new_state.enrollments {
                    if enrollment.status == EnrollmentStatus::Active {
                        enrollment.status = EnrollmentStatus::Canceled;
                    }
                }
            }
            Ok(TransitionResult { new_state })
        }
        Command::CreateOrder { amount_clp, method } => {
            let subscription_id: i64 = state
                .subscription
                .subscription_id
                .ok_or(CoreError::UnpersistedSubscription)?;

            let mut new_state: SubscriptionState = state.clone();
            new_state
                .orders
                .push(Order::new_pending(subscription_id, amount_clp, method));
            Ok(TransitionResult { new_state })
        }
        Command::MarkOrderPaid { order_id } => {
            transition_order(state, order_id, PaymentStatus::Paid).map(|mut result| {
                // Activation fires only on the pending -> paid edge while
                // the subscription itself is still pending. A paid
                // renewal order on an active subscription is a no-op here.
                if result.order_was_transitioned
                    && result.new_state.subscription.status == SubscriptionStatus::Pending
                {
                    result.new_state.subscription.status = SubscriptionStatus::Active;
                    result.new_state.subscription.end_date = None;
                }
                TransitionResult {
                    new_state: result.new_state,
                }
            })
        }
        Command::MarkOrderFailed { order_id } => {
            transition_order(state, order_id, PaymentStatus::Failed).map(|result| {
                TransitionResult {
                    new_state: result.new_state,
                }
            })
        }
        Command::MarkOrderPending { order_id } => {
            transition_order(state, order_id, PaymentStatus::Pending).map(|result| {
                TransitionResult {
                    new_state: result.new_state,
                }
            })
        }
    }
}

/// Intermediate result of an order transition.
struct OrderTransition {
    new_state: SubscriptionState,
    /// False when the order was already in the target state (no-op).
    order_was_transitioned: bool,
}

/// Moves an order to `target`, enforcing the payment state machine.
///
/// Re-applying the current state is a no-op rather than an error, so admin
/// double-submits stay harmless and never re-fire side effects.
fn transition_order(
    state: &SubscriptionState,
    order_id: i64,
    target: PaymentStatus,
) -> Result<OrderTransition, CoreError> {
    let mut new_state: SubscriptionState = state.clone();
    let order: &mut Order = new_state
        .orders
        .iter_mut()
        .find(|o| o.order_id == Some(order_id))
        .ok_or(CoreError::OrderNotFound(order_id))?;

    if order.payment_status == target {
        return Ok(OrderTransition {
            new_state,
            order_was_transitioned: false,
        });
    }

    if !order.payment_status.can_transition_to(target) {
        return Err(CoreError::DomainViolation(
            DomainError::InvalidPaymentTransition {
                from: order.payment_status,
                to: target,
            },
        ));
    }

    order.payment_status = target;
    Ok(OrderTransition {
        new_state,
        order_was_transitioned: true,
    })
}
