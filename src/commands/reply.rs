// reply.rs - Reply Model
// Handlers describe what to send as a `Reply`; the functions here turn it into
// serenity builders for channel messages and interaction responses.
//
// `ephemeral` only has an effect on interaction responses. Text commands have
// no private replies, so they always answer in the channel.

use serenity::{
    builder::CreateEmbed,
    client::Context,
    model::{
        application::interaction::{
            application_command::ApplicationCommandInteraction, InteractionResponseType,
        },
        channel::Message,
        Timestamp,
    },
};

pub const COLOR_SUCCESS: u32 = 0x2ECC71;
pub const COLOR_FAILURE: u32 = 0xE74C3C;
pub const COLOR_WARNING: u32 = 0xF39C12;
pub const COLOR_LIMIT: u32 = 0xF1C40F;
pub const COLOR_INFO: u32 = 0x7289DA;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyEmbed {
    pub title: Option<String>,
    pub description: Option<String>,
    pub color: u32,
    pub fields: Vec<EmbedField>,
    pub footer: Option<String>,
    pub timestamp: bool,
}

impl ReplyEmbed {
    pub fn new(color: u32) -> Self {
        ReplyEmbed {
            title: None,
            description: None,
            color,
            fields: Vec::new(),
            footer: None,
            timestamp: false,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    pub fn with_timestamp(mut self) -> Self {
        self.timestamp = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub content: Option<String>,
    pub embed: Option<ReplyEmbed>,
    pub ephemeral: bool,
}

impl Reply {
    pub fn text(content: impl Into<String>) -> Self {
        Reply {
            content: Some(content.into()),
            embed: None,
            ephemeral: false,
        }
    }

    pub fn embed(embed: ReplyEmbed) -> Self {
        Reply {
            content: None,
            embed: Some(embed),
            ephemeral: false,
        }
    }

    pub fn ephemeral(mut self, ephemeral: bool) -> Self {
        self.ephemeral = ephemeral;
        self
    }

    /// All user-visible text in the reply
    #[cfg(test)]
    pub fn plain_text(&self) -> String {
        let mut parts = Vec::new();
        if let Some(content) = &self.content {
            parts.push(content.clone());
        }
        if let Some(embed) = &self.embed {
            parts.extend(embed.title.iter().cloned());
            parts.extend(embed.description.iter().cloned());
            for field in &embed.fields {
                parts.push(field.name.clone());
                parts.push(field.value.clone());
            }
            parts.extend(embed.footer.iter().cloned());
        }
        parts.join("\n")
    }
}

// ============================================================================
// RENDERING
// ============================================================================

pub fn apply_embed<'a>(e: &'a mut CreateEmbed, embed: &ReplyEmbed) -> &'a mut CreateEmbed {
    if let Some(title) = &embed.title {
        e.title(title);
    }
    if let Some(description) = &embed.description {
        e.description(description);
    }
    e.color(embed.color);
    for field in &embed.fields {
        e.field(&field.name, &field.value, field.inline);
    }
    if let Some(footer) = &embed.footer {
        e.footer(|f| f.text(footer));
    }
    if embed.timestamp {
        e.timestamp(Timestamp::now());
    }
    e
}

/// Answer a text command in its channel, as a reply to the invoking message
pub async fn send_to_channel(ctx: &Context, msg: &Message, reply: &Reply) -> serenity::Result<Message> {
    msg.channel_id
        .send_message(&ctx.http, |m| {
            if let Some(content) = &reply.content {
                m.content(content);
            }
            if let Some(embed) = &reply.embed {
                m.embed(|e| apply_embed(e, embed));
            }
            m.reference_message(msg);
            m
        })
        .await
}

/// Answer a slash command immediately
pub async fn respond(
    ctx: &Context,
    interaction: &ApplicationCommandInteraction,
    reply: &Reply,
) -> serenity::Result<()> {
    interaction
        .create_interaction_response(&ctx.http, |response| {
            response
                .kind(InteractionResponseType::ChannelMessageWithSource)
                .interaction_response_data(|message| {
                    if let Some(content) = &reply.content {
                        message.content(content);
                    }
                    if let Some(embed) = &reply.embed {
                        message.embed(|e| apply_embed(e, embed));
                    }
                    message.ephemeral(reply.ephemeral)
                })
        })
        .await
}

/// Acknowledge a slash command and show the "thinking" indicator
pub async fn defer(ctx: &Context, interaction: &ApplicationCommandInteraction) -> serenity::Result<()> {
    interaction
        .create_interaction_response(&ctx.http, |response| {
            response.kind(InteractionResponseType::DeferredChannelMessageWithSource)
        })
        .await
}

/// Replace the deferred indicator with the final reply.
/// Public replies edit the deferred message in place; private ones remove it
/// and arrive as an ephemeral follow-up.
pub async fn finish_deferred(
    ctx: &Context,
    interaction: &ApplicationCommandInteraction,
    reply: &Reply,
) -> serenity::Result<()> {
    if reply.ephemeral {
        interaction.delete_original_interaction_response(&ctx.http).await?;
        follow_up(ctx, interaction, reply).await?;
    } else {
        interaction
            .edit_original_interaction_response(&ctx.http, |response| {
                if let Some(content) = &reply.content {
                    response.content(content);
                }
                if let Some(embed) = &reply.embed {
                    response.embed(|e| apply_embed(e, embed));
                }
                response
            })
            .await?;
    }
    Ok(())
}

/// Send an extra message on an interaction that already has a response
pub async fn follow_up(
    ctx: &Context,
    interaction: &ApplicationCommandInteraction,
    reply: &Reply,
) -> serenity::Result<()> {
    interaction
        .create_followup_message(&ctx.http, |followup| {
            if let Some(content) = &reply.content {
                followup.content(content);
            }
            if let Some(embed) = &reply.embed {
                followup.embed(|e| apply_embed(e, embed));
            }
            followup.ephemeral(reply.ephemeral)
        })
        .await?;
    Ok(())
}

/// Private notice for a slash command whose handler failed
pub fn failure_reply() -> Reply {
    Reply::text("❌ Something went wrong while running this command.").ephemeral(true)
}

/// Tell the user a slash command failed. The handler may already have answered
/// or deferred, in which case the initial response is refused and a follow-up
/// is sent instead.
pub async fn report_failure(ctx: &Context, interaction: &ApplicationCommandInteraction) -> serenity::Result<()> {
    let reply = failure_reply();
    if let Err(e) = respond(ctx, interaction, &reply).await {
        log::debug!("Initial response refused ({}), sending a follow-up", e);
        follow_up(ctx, interaction, &reply).await?;
    }
    Ok(())
}
