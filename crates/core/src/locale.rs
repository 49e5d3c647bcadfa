//! Reply strings in the languages a guild can pick.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Fr,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::En, Language::Fr];

    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Fr => "fr",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "en" => Some(Language::En),
            "fr" => Some(Language::Fr),
            _ => None,
        }
    }

    pub fn available() -> String {
        Self::ALL.map(Language::code).join(", ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Text {
    GuildOnly,
    AdminOnly,
    CommandFailed,
    LanguageSet,
    LanguageInvalid,
    AutoroleSaved,
    AutoroleInvalidExpiry,
    AutoroleRemoved,
    AutoroleNone,
    AutoroleLogsSet,
    StickySet,
    StickyRemoved,
    StickyMissing,
    VoiceSetup,
    VoiceRemoved,
    VoiceNotCreator,
    VoiceNone,
    VoiceInvalidName,
    QuizSaved,
    QuizNotConfigured,
    QuizDisabled,
    QuizCheckFailed,
    MassGiveNeedsTarget,
    MassGiveNothingToDo,
    AutoroleGranted,
    AutoroleGrantFailed,
    AutoroleRevoked,
    AutoroleRevokeFailed,
}

/// Looks up a string and fills `{name}` placeholders.
pub fn text(language: Language, key: Text, args: &[(&str, &str)]) -> String {
    let mut rendered = template(language, key).to_string();
    for (name, value) in args {
        rendered = rendered.replace(&format!("{{{name}}}"), value);
    }
    rendered
}

fn template(language: Language, key: Text) -> &'static str {
    use Text::*;
    match (language, key) {
        (Language::En, GuildOnly) => "This command can only be used in a server.",
        (Language::Fr, GuildOnly) => "Cette commande ne peut être utilisée que sur un serveur.",
        (Language::En, AdminOnly) => "Only administrators can use this command.",
        (Language::Fr, AdminOnly) => "Seuls les administrateurs peuvent utiliser cette commande.",
        (Language::En, CommandFailed) => "An error occurred while running this command: {error}",
        (Language::Fr, CommandFailed) => "Une erreur est survenue lors de l'exécution de cette commande : {error}",
        (Language::En, LanguageSet) => "Language set to English.",
        (Language::Fr, LanguageSet) => "Langue définie sur le français.",
        (Language::En, LanguageInvalid) => "Unknown language. Available: {langs}",
        (Language::Fr, LanguageInvalid) => "Langue inconnue. Disponibles : {langs}",
        (Language::En, AutoroleSaved) => "Auto-role saved: {role} (trigger={trigger}, expiry={expiry}, skip rejoins={rejoin})",
        (Language::Fr, AutoroleSaved) => "Auto-rôle enregistré : {role} (déclencheur={trigger}, expiration={expiry}, ignorer les retours={rejoin})",
        (Language::En, AutoroleInvalidExpiry) => "Expiry time must be greater than 0 minutes!",
        (Language::Fr, AutoroleInvalidExpiry) => "La durée d'expiration doit être supérieure à 0 minute !",
        (Language::En, AutoroleRemoved) => "Auto-role configuration removed.",
        (Language::Fr, AutoroleRemoved) => "Configuration d'auto-rôle supprimée.",
        (Language::En, AutoroleNone) => "No auto-role is configured for this server.",
        (Language::Fr, AutoroleNone) => "Aucun auto-rôle configuré pour ce serveur.",
        (Language::En, AutoroleLogsSet) => "Auto-role log channel set to {channel}",
        (Language::Fr, AutoroleLogsSet) => "Salon de logs d'auto-rôle défini sur {channel}",
        (Language::En, StickySet) => "Sticky message set in {channel}",
        (Language::Fr, StickySet) => "Message épinglé défini dans {channel}",
        (Language::En, StickyRemoved) => "Sticky message removed from {channel}",
        (Language::Fr, StickyRemoved) => "Message épinglé supprimé de {channel}",
        (Language::En, StickyMissing) => "There is no sticky message in {channel}",
        (Language::Fr, StickyMissing) => "Aucun message épinglé dans {channel}",
        (Language::En, VoiceSetup) => "Created {channel}: new channels named `{template}` go {location} it (limit: {limit})",
        (Language::Fr, VoiceSetup) => "{channel} créé : les nouveaux salons `{template}` seront placés {location} (limite : {limit})",
        (Language::En, VoiceRemoved) => "Voice channel creator removed.",
        (Language::Fr, VoiceRemoved) => "Créateur de salon vocal supprimé.",
        (Language::En, VoiceNotCreator) => "This channel is not a voice channel creator.",
        (Language::Fr, VoiceNotCreator) => "Ce salon n'est pas un créateur de salon vocal.",
        (Language::En, VoiceNone) => "No voice channel creator on this server.",
        (Language::Fr, VoiceNone) => "Aucun créateur de salon vocal sur ce serveur.",
        (Language::En, VoiceInvalidName) => "Names must be between 1 and 100 characters!",
        (Language::Fr, VoiceInvalidName) => "Les noms doivent contenir entre 1 et 100 caractères !",
        (Language::En, QuizSaved) => "Quiz automation configured: sheet {sheet}, waiting role {waiting}, access role {access}, minimum {min}/{max}, every {interval}s",
        (Language::Fr, QuizSaved) => "Automatisation du quiz configurée : feuille {sheet}, rôle d'attente {waiting}, rôle d'accès {access}, minimum {min}/{max}, toutes les {interval}s",
        (Language::En, QuizNotConfigured) => "No spreadsheet is configured.",
        (Language::Fr, QuizNotConfigured) => "Aucune feuille Google Sheets configurée.",
        (Language::En, QuizDisabled) => "Google Sheets credentials are not configured on this bot.",
        (Language::Fr, QuizDisabled) => "Les identifiants Google Sheets ne sont pas configurés sur ce bot.",
        (Language::En, QuizCheckFailed) => "❌ Quiz results check failed: {error}",
        (Language::Fr, QuizCheckFailed) => "❌ Erreur lors de la vérification des résultats du quiz : {error}",
        (Language::En, MassGiveNeedsTarget) => "Pick a filter role or the everyone option.",
        (Language::Fr, MassGiveNeedsTarget) => "Veuillez préciser un rôle filtre ou choisir l'option @everyone.",
        (Language::En, MassGiveNothingToDo) => "No member needs updating.",
        (Language::Fr, MassGiveNothingToDo) => "Aucun membre à mettre à jour.",
        (Language::En, AutoroleGranted) => "✅ Role {role} given to {member} ({trigger})",
        (Language::Fr, AutoroleGranted) => "✅ Rôle {role} attribué à {member} ({trigger})",
        (Language::En, AutoroleGrantFailed) => "❌ Could not give {role} to {member} ({trigger}): {error}",
        (Language::Fr, AutoroleGrantFailed) => "❌ Impossible d'attribuer {role} à {member} ({trigger}) : {error}",
        (Language::En, AutoroleRevoked) => "⏰ Role {role} removed from {member} (expired)",
        (Language::Fr, AutoroleRevoked) => "⏰ Rôle {role} retiré de {member} (expiré)",
        (Language::En, AutoroleRevokeFailed) => "❌ Could not remove expired role {role} from {member}: {error}",
        (Language::Fr, AutoroleRevokeFailed) => "❌ Impossible de retirer le rôle expiré {role} de {member} : {error}",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_filled() {
        let rendered = text(Language::En, Text::StickySet, &[("channel", "<#5>")]);
        assert_eq!(rendered, "Sticky message set in <#5>");
    }

    #[test]
    fn parses_codes_loosely() {
        assert_eq!(Language::parse(" FR "), Some(Language::Fr));
        assert_eq!(Language::parse("de"), None);
        assert_eq!(Language::available(), "en, fr");
    }
}
