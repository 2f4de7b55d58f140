use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        admin::{ApproveTutorRequest, DispatchReport, PendingTutor, PendingTutorList, RejectTutorRequest},
        bookings::{
            BookingDetail, BookingList, CreateBookingRequest, CreateReviewRequest, MarkPaidRequest,
            UpdateBookingStatusRequest,
        },
        payments::{CheckoutResponse, CreatePaymentRequest, GatewayNotification, WebhookAck},
        search::{SearchMode, TutorSearchHit, TutorSearchResult},
        tutors::{AvailabilityInput, OnboardingRequest, PublicTutorDetail, TutorMe},
    },
    entity::{
        bookings::BookingStatus, cities::CityType, notification_outbox::OutboxStatus,
        payments::PaymentStatus, profiles::Role, tutor_profiles::TutorStatus,
        villages::VillageType,
    },
    models::{
        AvailabilitySlot, Booking, City, District, Notification, Payment, Province, PublicTutor,
        Review, TutorProfile, TutorWallet, Village,
    },
    response::{ApiResponse, Meta},
    routes::{admin, bookings, health, params, payments, tutors, wilayah},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        wilayah::list_provinces,
        wilayah::list_cities,
        wilayah::list_districts,
        wilayah::list_villages,
        tutors::search_tutors,
        tutors::get_tutor,
        tutors::get_me,
        tutors::submit_onboarding,
        tutors::get_wallet,
        bookings::create_booking,
        bookings::list_bookings,
        bookings::get_booking,
        bookings::update_status,
        bookings::create_review,
        bookings::mark_paid,
        payments::create_payment,
        payments::payment_webhook,
        admin::list_pending_tutors,
        admin::approve_tutor,
        admin::reject_tutor,
        admin::list_notifications,
        admin::dispatch_notifications
    ),
    components(
        schemas(
            Role,
            TutorStatus,
            BookingStatus,
            PaymentStatus,
            OutboxStatus,
            CityType,
            VillageType,
            Province,
            City,
            District,
            Village,
            AvailabilitySlot,
            AvailabilityInput,
            TutorProfile,
            PublicTutor,
            TutorWallet,
            Booking,
            Payment,
            Review,
            Notification,
            OnboardingRequest,
            TutorMe,
            PublicTutorDetail,
            SearchMode,
            TutorSearchHit,
            TutorSearchResult,
            CreateBookingRequest,
            UpdateBookingStatusRequest,
            MarkPaidRequest,
            CreateReviewRequest,
            BookingList,
            BookingDetail,
            CreatePaymentRequest,
            CheckoutResponse,
            GatewayNotification,
            WebhookAck,
            ApproveTutorRequest,
            RejectTutorRequest,
            PendingTutor,
            PendingTutorList,
            DispatchReport,
            params::Pagination,
            params::BookingListQuery,
            params::NotificationListQuery,
            Meta,
            ApiResponse<TutorProfile>,
            ApiResponse<TutorSearchResult>,
            ApiResponse<BookingList>,
            ApiResponse<BookingDetail>,
            ApiResponse<Booking>,
            ApiResponse<CheckoutResponse>,
            ApiResponse<WebhookAck>,
            ApiResponse<PendingTutorList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Wilayah", description = "Indonesian administrative divisions"),
        (name = "Tutors", description = "Tutor search, public profiles and onboarding"),
        (name = "Bookings", description = "Booking lifecycle"),
        (name = "Payments", description = "Hosted checkout and gateway notifications"),
        (name = "Admin", description = "Tutor review and notification outbox"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
