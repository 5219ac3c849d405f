use utoipa::OpenApi;

/// Aggregated OpenAPI specification for Storyfold Back.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::party::create_party,
        crate::routes::party::join_party,
        crate::routes::party::party_status,
        crate::routes::player::get_pronouns,
        crate::routes::player::set_pronouns,
        crate::routes::player::leave_party,
        crate::routes::round::start_round,
        crate::routes::round::get_form,
        crate::routes::round::submit_entry,
        crate::routes::round::end_round,
        crate::routes::round::round_results,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::party::CreatePartyRequest,
            crate::dto::party::JoinPartyRequest,
            crate::dto::party::JoinPartyResponse,
            crate::dto::party::PartyStatusResponse,
            crate::dto::party::RosterEntryDto,
            crate::dto::player::PronounsDto,
            crate::dto::round::StartRoundRequest,
            crate::dto::round::EntryRequest,
            crate::dto::round::FormResponse,
            crate::dto::round::EntryDto,
            crate::dto::round::StoryResultDto,
            crate::dto::round::ResultsResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "party", description = "Party creation, join, and status"),
        (name = "player", description = "Player-scoped operations"),
        (name = "round", description = "Round lifecycle and story writing"),
    )
)]
pub struct ApiDoc;
