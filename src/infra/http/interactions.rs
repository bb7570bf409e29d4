//! Interaction dispatch: ping, slash/user/message commands and the quote
//! modal. Commands that generate an image answer with a deferred response
//! and finish in a background task that edits the original message.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use metrics::counter;
use tracing::{error, info, warn};

use crate::application::error::AppError;
use crate::application::image::QuoteRequest;
use crate::infra::discord::types::{
    COMMAND_CHAT_INPUT, COMMAND_MESSAGE, COMMAND_USER, INTERACTION_APPLICATION_COMMAND,
    INTERACTION_MODAL_SUBMIT, INTERACTION_PING, Interaction, InteractionResponse,
};

use super::AppState;

const METRIC_QUOTE_TOTAL: &str = "meigen_quote_total";
const METRIC_QUOTE_FAIL: &str = "meigen_quote_fail_total";

const QUOTE_MODAL_PREFIX: &str = "quote:";
const TEXT_INPUT_ID: &str = "text";

pub(super) async fn handle(
    State(state): State<AppState>,
    Json(interaction): Json<Interaction>,
) -> Response {
    match interaction.kind {
        INTERACTION_PING => Json(InteractionResponse::pong()).into_response(),
        INTERACTION_APPLICATION_COMMAND => handle_command(state, interaction),
        INTERACTION_MODAL_SUBMIT => handle_modal_submit(state, interaction),
        _ => (StatusCode::BAD_REQUEST, "Unknown interaction type").into_response(),
    }
}

fn handle_command(state: AppState, interaction: Interaction) -> Response {
    let Some(data) = interaction.data.as_ref() else {
        return unknown_command_response();
    };

    match (data.kind, data.name.as_deref()) {
        (Some(COMMAND_CHAT_INPUT), Some("ping")) => {
            Json(InteractionResponse::ephemeral_message("pong!")).into_response()
        }
        (Some(COMMAND_CHAT_INPUT), Some("quote")) => match data.user_option("user") {
            Some(user_id) => Json(InteractionResponse::quote_modal(&user_id)).into_response(),
            None => unknown_command_response(),
        },
        (Some(COMMAND_USER), Some("quote")) => match data.target_id.as_deref() {
            Some(user_id) => Json(InteractionResponse::quote_modal(user_id)).into_response(),
            None => unknown_command_response(),
        },
        (Some(COMMAND_MESSAGE), Some("quote")) => {
            let Some(message) = data.target_message() else {
                return unknown_command_response();
            };
            spawn_quote_follow_up(
                state,
                interaction.application_id.clone(),
                interaction.token.clone(),
                message.author.id.clone(),
                message.content.clone(),
            );
            Json(InteractionResponse::deferred()).into_response()
        }
        _ => unknown_command_response(),
    }
}

fn handle_modal_submit(state: AppState, interaction: Interaction) -> Response {
    let Some(data) = interaction.data.as_ref() else {
        return unknown_command_response();
    };
    let Some(user_id) = data
        .custom_id
        .as_deref()
        .and_then(|custom_id| custom_id.strip_prefix(QUOTE_MODAL_PREFIX))
    else {
        return unknown_command_response();
    };
    let Some(text) = data.text_input_value(TEXT_INPUT_ID) else {
        return unknown_command_response();
    };

    spawn_quote_follow_up(
        state,
        interaction.application_id.clone(),
        interaction.token.clone(),
        user_id.to_string(),
        text.to_string(),
    );
    Json(InteractionResponse::deferred()).into_response()
}

/// The response is already deferred; generation continues here and edits
/// the original message with the PNG, or with an error notice.
fn spawn_quote_follow_up(
    state: AppState,
    application_id: String,
    token: String,
    member_id: String,
    text: String,
) {
    tokio::spawn(async move {
        counter!(METRIC_QUOTE_TOTAL).increment(1);
        if let Err(quote_error) =
            send_quote_follow_up(&state, &application_id, &token, &member_id, &text).await
        {
            counter!(METRIC_QUOTE_FAIL).increment(1);
            error!(
                target = "meigen::http::interactions",
                member_id = %member_id,
                error = %quote_error,
                "quote follow-up failed"
            );
            let notice = format!("エラーが発生しました\n```\n{quote_error}\n```");
            if let Err(edit_error) = state
                .discord
                .edit_original_message(&application_id, &token, &notice)
                .await
            {
                warn!(
                    target = "meigen::http::interactions",
                    error = %edit_error,
                    "failed to deliver the error follow-up"
                );
            }
        }
    });
}

async fn send_quote_follow_up(
    state: &AppState,
    application_id: &str,
    token: &str,
    member_id: &str,
    text: &str,
) -> Result<(), AppError> {
    let member = state.discord.guild_member(&state.guild_id, member_id).await?;
    let mention_names = state
        .discord
        .resolve_mention_names(&state.guild_id, text, &member)
        .await;
    let icon_url = state.discord.avatar_url(&state.guild_id, &member);

    let request = QuoteRequest {
        icon_url,
        text: text.to_string(),
        name: member.display_name().to_string(),
        handle: member.user.username.clone(),
        mention_names,
    };
    let image = state.quotes.generate(&request).await?;
    state
        .discord
        .attach_quote_image(application_id, token, image)
        .await?;

    info!(
        target = "meigen::http::interactions",
        member_id = %member_id,
        "quote delivered"
    );
    Ok(())
}

fn unknown_command_response() -> Response {
    Json(InteractionResponse::error_message(
        "存在しないコマンドが実行されました。",
    ))
    .into_response()
}
