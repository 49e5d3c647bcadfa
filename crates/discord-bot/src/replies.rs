//! Plain-text command replies.

use repere_core::locale::Language;
use repere_core::mass_grant::MassGrantReport;
use repere_core::matching::format_score;
use repere_core::models::RoleId;
use repere_core::models::server::AutoroleConfig;
use repere_core::models::voice::{ChannelPosition, VoiceCreatorConfig};
use repere_core::quiz::{QuizStatus, Submission};

/// Discord rejects longer message contents.
pub const MESSAGE_LIMIT: usize = 2000;
/// Members listed per role before the rest is summarised.
pub const MAX_LISTED: usize = 25;
pub const PREVIEW_ROWS: usize = 5;

fn pick(language: Language, en: &'static str, fr: &'static str) -> &'static str {
    match language {
        Language::En => en,
        Language::Fr => fr,
    }
}

fn yes_no(language: Language, value: bool) -> &'static str {
    match value {
        true => pick(language, "yes", "oui"),
        false => pick(language, "no", "non"),
    }
}

/// Cuts `content` to the message limit on a character boundary.
pub fn truncate(content: &str) -> String {
    if content.chars().count() <= MESSAGE_LIMIT {
        return content.to_string();
    }
    let mut cut: String = content.chars().take(MESSAGE_LIMIT - 1).collect();
    cut.push('…');
    cut
}

fn more_line(language: Language, hidden: usize) -> Option<String> {
    (hidden > 0).then(|| format!("… {} {hidden} {}", pick(language, "and", "et"), pick(language, "more", "autres")))
}

pub fn expiry_label(language: Language, config: &AutoroleConfig) -> String {
    match config.expiry_minutes.filter(|minutes| *minutes > 0) {
        Some(minutes) => format!("{minutes} min"),
        None => pick(language, "none", "aucune").to_string(),
    }
}

pub fn autorole_configs(language: Language, configs: &[AutoroleConfig]) -> String {
    let mut lines = vec![pick(language, "**Auto-role configuration**", "**Configuration des auto-rôles**").to_string()];
    for config in configs {
        lines.push(format!(
            "• {}: {} {}, {} {}, {} {}",
            config.role_id.mention(),
            pick(language, "trigger", "déclencheur"),
            config.trigger.as_str(),
            pick(language, "expiry", "expiration"),
            expiry_label(language, config),
            pick(language, "skip rejoins", "ignorer les retours"),
            yes_no(language, config.check_rejoin),
        ));
    }
    lines.join("\n")
}

/// Members holding one expiring auto-role, with the minutes they have left.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpiryListing {
    pub role: RoleId,
    pub members: Vec<(String, Option<i64>)>,
}

pub fn expiry_list(language: Language, listings: &[ExpiryListing]) -> String {
    let mut sections = Vec::new();
    for listing in listings {
        let mut lines = vec![format!("{} {}:", pick(language, "Members with", "Membres avec"), listing.role.mention())];
        if listing.members.is_empty() {
            lines.push(pick(language, "No member holds this role.", "Aucun membre ne possède ce rôle.").to_string());
        }
        for (name, minutes) in listing.members.iter().take(MAX_LISTED) {
            lines.push(match minutes {
                Some(minutes) => format!("• {name}: {minutes} {}", pick(language, "min left", "min restantes")),
                None => format!("• {name}: {}", pick(language, "not tracked", "non suivi")),
            });
        }
        lines.extend(more_line(language, listing.members.len().saturating_sub(MAX_LISTED)));
        sections.push(lines.join("\n"));
    }
    sections.join("\n\n")
}

pub fn no_expiry_list(language: Language, listings: &[(RoleId, Vec<String>)]) -> String {
    let mut sections = Vec::new();
    for (role, members) in listings {
        if members.is_empty() {
            sections.push(format!("{} {}: {}", pick(language, "Role", "Rôle"), role.mention(), pick(language, "no member", "aucun membre")));
            continue;
        }
        let mut lines = vec![format!(
            "{} {} ({}):",
            pick(language, "Role", "Rôle"),
            role.mention(),
            pick(language, "no expiry", "sans expiration")
        )];
        lines.extend(members.iter().take(MAX_LISTED).map(|name| format!("• {name}")));
        lines.extend(more_line(language, members.len().saturating_sub(MAX_LISTED)));
        sections.push(lines.join("\n"));
    }
    sections.join("\n\n")
}

pub fn position_label(language: Language, position: ChannelPosition) -> &'static str {
    match position {
        ChannelPosition::Before => pick(language, "before", "avant"),
        ChannelPosition::After => pick(language, "after", "après"),
    }
}

pub fn limit_label(language: Language, limit: u32) -> String {
    match limit {
        0 => pick(language, "unlimited", "illimitée").to_string(),
        limit => limit.to_string(),
    }
}

pub fn voice_creators(language: Language, creators: &[VoiceCreatorConfig]) -> String {
    let mut lines = vec![pick(language, "**Voice channel creators**", "**Créateurs de salons vocaux**").to_string()];
    for creator in creators {
        lines.push(format!(
            "• {}: `{}` ({}, {} {})",
            creator.channel_id.mention(),
            creator.template_name,
            position_label(language, creator.position),
            pick(language, "limit", "limite"),
            limit_label(language, creator.user_limit),
        ));
    }
    lines.join("\n")
}

pub fn quiz_status(language: Language, status: &QuizStatus, enabled: bool) -> String {
    let unset = pick(language, "not set", "non défini");
    let role = |role: Option<RoleId>| role.map_or_else(|| unset.to_string(), RoleId::mention);
    let state = match enabled && status.spreadsheet_id.is_some() {
        true => pick(language, "✅ Active", "✅ Actif"),
        false => pick(language, "❌ Inactive", "❌ Inactif"),
    };
    let mut lines = vec![
        pick(language, "**Quiz automation status**", "**Statut de l'automatisation du quiz**").to_string(),
        format!("{}: {state}", pick(language, "Status", "Statut")),
        format!(
            "{}: {}",
            pick(language, "Spreadsheet", "Feuille Google Sheets"),
            status.spreadsheet_id.as_deref().unwrap_or(unset)
        ),
        format!("{}: {}s", pick(language, "Check interval", "Intervalle de vérification"), status.check_interval),
        format!(
            "{}: {}/{}",
            pick(language, "Minimum score", "Note minimale"),
            format_score(status.min_score),
            format_score(status.max_score)
        ),
        format!("{}: {}", pick(language, "Waiting role", "Rôle d'attente"), role(status.waiting_role_id)),
        format!("{}: {}", pick(language, "Access role", "Rôle d'accès"), role(status.access_role_id)),
        format!("{}: {}", pick(language, "Rows granted", "Lignes traitées"), status.processed_rows),
    ];
    if let Some(row) = status.last_processed_row {
        lines.push(format!("{}: {row}", pick(language, "Last processed row", "Dernière ligne traitée")));
    }
    if let Some(rows) = status.last_seen_data_rows {
        lines.push(format!("{}: {rows}", pick(language, "Rows in sheet", "Lignes dans la feuille")));
    }
    lines.join("\n")
}

pub fn quiz_preview(language: Language, submissions: &[Submission], max_score: f64) -> String {
    let mut lines = vec![
        pick(language, "✅ Connected to Google Sheets", "✅ Connexion à Google Sheets réussie").to_string(),
        format!("{}: {}", pick(language, "Results found", "Résultats trouvés"), submissions.len()),
    ];
    for submission in submissions.iter().take(PREVIEW_ROWS) {
        lines.push(format!(
            "• {}: {}/{}",
            submission.pseudo,
            format_score(submission.score),
            format_score(max_score)
        ));
    }
    lines.extend(more_line(language, submissions.len().saturating_sub(PREVIEW_ROWS)));
    lines.join("\n")
}

pub fn mass_grant_summary(language: Language, role: RoleId, report: &MassGrantReport) -> String {
    format!(
        "{} {}: {} {}, {} {}, {} {}",
        pick(language, "Mass grant of", "Attribution en masse de"),
        role.mention(),
        report.total,
        pick(language, "targeted", "ciblés"),
        report.success,
        pick(language, "succeeded", "réussis"),
        report.failed,
        pick(language, "failed", "échecs"),
    )
}

pub fn help(language: Language) -> String {
    match language {
        Language::En => "\
**Voice channels**
`/setupvoice` create a voice channel creator
`/removevoice` remove a voice channel creator
`/listvoice` list voice channel creators

**Configuration**
`/config language` set the bot language
`/config autorole` add or update an auto-role (on_join/on_quiz_access, optional expiry)
`/config remove_autorole` remove one auto-role or all of them
`/config autorole_logs` set the auto-role log channel
`/config sticky` set a sticky message
`/config remove_sticky` remove a sticky message

**Auto-role tools**
`/autorole list_configs` show the auto-role configuration
`/autorole list_expiry` members and the time left before expiry
`/autorole list_no_expiry` members holding an auto-role without expiry

**Quiz**
`/quiz setup` configure the Google Sheets automation
`/quiz status` show the automation state
`/quiz test` test the spreadsheet connection

**Mass grant**
`/massgive target_role everyone:true` give a role to the whole server
`/massgive target_role filter_role` give a role to members holding the filter role"
            .to_string(),
        Language::Fr => "\
**Salons vocaux**
`/setupvoice` créer un créateur de salon vocal
`/removevoice` supprimer un créateur de salon vocal
`/listvoice` lister les créateurs de salons vocaux

**Configuration**
`/config language` définir la langue
`/config autorole` ajouter ou mettre à jour un auto-rôle (on_join/on_quiz_access, expiration facultative)
`/config remove_autorole` supprimer un auto-rôle ou tous
`/config autorole_logs` définir le salon de logs auto-rôle
`/config sticky` définir un message épinglé
`/config remove_sticky` supprimer un message épinglé

**Auto-rôle (outils)**
`/autorole list_configs` afficher la configuration des auto-rôles
`/autorole list_expiry` membres et temps restant avant expiration
`/autorole list_no_expiry` membres ayant un auto-rôle sans expiration

**Quiz**
`/quiz setup` configurer l'automatisation (Google Sheets)
`/quiz status` afficher l'état
`/quiz test` tester la connexion

**Attribution en masse**
`/massgive target_role everyone:true` attribuer à tout le serveur
`/massgive target_role filter_role` attribuer à ceux qui ont le rôle filtre"
            .to_string(),
    }
}
