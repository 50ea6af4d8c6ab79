//! Business preset default tables
//!
//! Each preset is a fixed bundle of scheduling parameters for a business
//! type. The values are data, not behavior: preset polymorphism is a tagged
//! variant plus this lookup table, never subtype dispatch.

use rust_decimal::Decimal;
use shared::models::settings::{
    BusinessPreset, QueueAssignmentMode, QueueDispatchMode, ReservationSettings,
};

/// Default settings bundle for a preset
pub fn defaults(preset: BusinessPreset) -> ReservationSettings {
    match preset {
        BusinessPreset::Salon => ReservationSettings {
            business_preset: BusinessPreset::Salon,
            buffer_minutes: 10,
            slot_interval_minutes: 15,
            min_notice_minutes: 60,
            max_advance_days: 60,
            cancellation_cutoff_hours: 24,
            allow_client_cancel: true,
            allow_client_reschedule: true,
            late_release_minutes: 10,
            waitlist_enabled: true,
            queue_mode_enabled: true,
            queue_assignment_mode: QueueAssignmentMode::PerStaff,
            queue_dispatch_mode: QueueDispatchMode::FifoWithAppointmentPriority,
            queue_grace_minutes: 5,
            queue_pre_call_threshold: 2,
            queue_no_show_on_grace_expiry: true,
            deposit_required: true,
            deposit_amount: Decimal::new(2000, 2),
            no_show_fee_enabled: true,
            no_show_fee_amount: Decimal::new(1500, 2),
        },
        BusinessPreset::Restaurant => ReservationSettings {
            business_preset: BusinessPreset::Restaurant,
            buffer_minutes: 15,
            slot_interval_minutes: 15,
            min_notice_minutes: 30,
            max_advance_days: 30,
            cancellation_cutoff_hours: 6,
            allow_client_cancel: true,
            allow_client_reschedule: true,
            late_release_minutes: 15,
            waitlist_enabled: true,
            queue_mode_enabled: false,
            queue_assignment_mode: QueueAssignmentMode::GlobalPull,
            queue_dispatch_mode: QueueDispatchMode::FifoWithAppointmentPriority,
            queue_grace_minutes: 10,
            queue_pre_call_threshold: 2,
            queue_no_show_on_grace_expiry: true,
            deposit_required: true,
            deposit_amount: Decimal::new(2500, 2),
            no_show_fee_enabled: true,
            no_show_fee_amount: Decimal::new(2500, 2),
        },
        BusinessPreset::ServiceGeneral => ReservationSettings {
            business_preset: BusinessPreset::ServiceGeneral,
            buffer_minutes: 0,
            slot_interval_minutes: 30,
            min_notice_minutes: 0,
            max_advance_days: 90,
            cancellation_cutoff_hours: 12,
            allow_client_cancel: true,
            allow_client_reschedule: true,
            late_release_minutes: 0,
            waitlist_enabled: false,
            queue_mode_enabled: false,
            queue_assignment_mode: QueueAssignmentMode::PerStaff,
            queue_dispatch_mode: QueueDispatchMode::FifoWithAppointmentPriority,
            queue_grace_minutes: 5,
            queue_pre_call_threshold: 2,
            queue_no_show_on_grace_expiry: false,
            deposit_required: false,
            deposit_amount: Decimal::ZERO,
            no_show_fee_enabled: false,
            no_show_fee_amount: Decimal::ZERO,
        },
    }
}
