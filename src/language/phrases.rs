use super::name::CapturedName;
use super::SupportedLanguage;

/// Which half of a name a field position holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameField {
    First,
    Last,
}

/// Everything the dialogue says or listens for in one language.
/// Profiles are static and read-only; there is no partial profile.
#[derive(Debug)]
pub struct LanguageProfile {
    pub language: SupportedLanguage,
    /// BCP 47 tag handed to both engines.
    pub voice_tag: &'static str,
    pub language_prompt: &'static str,
    pub language_not_understood: &'static str,
    pub name_prompt: &'static str,
    pub only_one_name: &'static str,
    pub try_again: &'static str,
    pub did_not_catch: &'static str,
    pub searching: &'static str,
    /// Spoken when recognition falls back to the default language.
    pub reduced_support_notice: &'static str,
    pub no_appointments: &'static str,
    pub checked_in: &'static str,
    pub search_failed: &'static str,
    /// (first, first spelled, last, last spelled)
    pub confirmation: fn(&str, &str, &str, &str) -> String,
    pub found_appointments: fn(usize) -> String,
    /// (index, date, staff, notes)
    pub appointment_details: fn(usize, &str, &str, Option<&str>) -> String,
    pub positive_words: &'static [&'static str],
    pub negative_words: &'static [&'static str],
    /// Ways a recognizer may transcribe the name of this language.
    pub language_keywords: &'static [&'static str],
    pub name_field_order: &'static [NameField],
}

impl LanguageProfile {
    /// The captured name in this language's customary order.
    pub fn display_name(&self, name: &CapturedName) -> String {
        self.name_field_order
            .iter()
            .map(|field| match field {
                NameField::First => name.first_name.as_str(),
                NameField::Last => name.last_name.as_str(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn confirmation_prompt(&self, name: &CapturedName) -> String {
        (self.confirmation)(
            &name.first_name,
            &super::spell_out(&name.first_name),
            &name.last_name,
            &super::spell_out(&name.last_name),
        )
    }
}

static ENGLISH: LanguageProfile = LanguageProfile {
    language: SupportedLanguage::En,
    voice_tag: "en-US",
    language_prompt: "Welcome! Please say English, Spanish, or Chinese to select your language.",
    language_not_understood: "I didn't understand. Please say English, Spanish, or Chinese.",
    name_prompt: "Please say your first name and last name.",
    only_one_name: "I only heard one name. Please say both your first name and last name.",
    try_again: "Let's try again. Please say your first name and last name.",
    did_not_catch: "I didn't catch that. Please say yes or no.",
    searching: "Searching for your appointments. Please wait.",
    reduced_support_notice: "Voice recognition for this language is limited.",
    no_appointments: "No upcoming appointments found. Please check with the front desk.",
    checked_in: "You are now checked in. Thank you!",
    search_failed: "Sorry, there was an error searching for appointments. Please try again or contact the front desk.",
    confirmation: |first, first_spelled, last, last_spelled| {
        format!(
            "I heard {first}, spelled {first_spelled}, {last}, spelled {last_spelled}. Is that correct? Please say yes or no."
        )
    },
    found_appointments: |count| {
        format!("Found {count} appointment{}.", if count == 1 { "" } else { "s" })
    },
    appointment_details: |idx, date, staff, notes| {
        let notes = notes.map(|n| format!("Notes: {n}. ")).unwrap_or_default();
        format!("Appointment {}: {date} with {staff}. {notes}", idx + 1)
    },
    positive_words: &["yes", "yeah", "correct", "right", "yep"],
    negative_words: &["no", "nope"],
    language_keywords: &["english", "inglés", "ingles"],
    name_field_order: &[NameField::First, NameField::Last],
};

static SPANISH: LanguageProfile = LanguageProfile {
    language: SupportedLanguage::Es,
    voice_tag: "es-US",
    language_prompt: "¡Bienvenido! Por favor diga inglés, español o chino para seleccionar su idioma.",
    language_not_understood: "No entendí. Por favor diga inglés, español o chino.",
    name_prompt: "Por favor diga su nombre y apellido.",
    only_one_name: "Solo escuché un nombre. Por favor diga su nombre y apellido.",
    try_again: "Intentemos de nuevo. Por favor diga su nombre y apellido.",
    did_not_catch: "No entendí eso. Por favor diga sí o no.",
    searching: "Buscando sus citas. Por favor espere.",
    reduced_support_notice: "El reconocimiento de voz para este idioma es limitado.",
    no_appointments: "No se encontraron citas próximas. Por favor consulte con la recepción.",
    checked_in: "Ya está registrado. ¡Gracias!",
    search_failed: "Lo sentimos, hubo un error al buscar sus citas. Intente de nuevo o consulte con la recepción.",
    confirmation: |first, first_spelled, last, last_spelled| {
        format!(
            "Escuché {first}, deletreado {first_spelled}, {last}, deletreado {last_spelled}. ¿Es correcto? Por favor diga sí o no."
        )
    },
    found_appointments: |count| {
        if count == 1 {
            format!("Se encontró {count} cita.")
        } else {
            format!("Se encontraron {count} citas.")
        }
    },
    appointment_details: |idx, date, staff, notes| {
        let notes = notes.map(|n| format!("Notas: {n}. ")).unwrap_or_default();
        format!("Cita {}: {date} con {staff}. {notes}", idx + 1)
    },
    positive_words: &["sí", "si", "correcto", "exacto", "yes", "yeah", "afirmativo"],
    negative_words: &["no"],
    language_keywords: &["spanish", "español", "espanol"],
    name_field_order: &[NameField::First, NameField::Last],
};

static CHINESE: LanguageProfile = LanguageProfile {
    language: SupportedLanguage::Zh,
    voice_tag: "zh-CN",
    language_prompt: "欢迎！请说英语、西班牙语或中文来选择您的语言。",
    language_not_understood: "我没听懂。请说英语、西班牙语或中文。",
    name_prompt: "请说您的名字和姓氏。",
    only_one_name: "我只听到一个名字。请说您的名字和姓氏。",
    try_again: "让我们再试一次。请说您的名字和姓氏。",
    did_not_catch: "我没听清楚。请说是或不是。",
    searching: "正在搜索您的预约。请稍候。",
    reduced_support_notice: "中文语音识别功能有限，我们将用英语识别您的名字。",
    no_appointments: "未找到即将到来的预约。请咨询前台。",
    checked_in: "您现在已登记入住。谢谢！",
    search_failed: "抱歉，搜索预约时出错。请重试或咨询前台。",
    confirmation: |first, first_spelled, last, last_spelled| {
        format!(
            "我听到的是{first}，拼写为{first_spelled}，{last}，拼写为{last_spelled}。这是正确的吗？请说是或不是。"
        )
    },
    found_appointments: |count| format!("找到了{count}个预约。"),
    appointment_details: |idx, date, staff, notes| {
        let notes = notes.map(|n| format!("备注：{n}。")).unwrap_or_default();
        format!("预约{}：{date}，与{staff}。{notes}", idx + 1)
    },
    positive_words: &["是", "对", "正确"],
    negative_words: &["不是", "不", "否"],
    language_keywords: &[
        "chinese",
        "中文",
        "mandarin",
        "zhongwen",
        "zhong wen",
        "jong wen",
        "jung wen",
        "chung wen",
    ],
    name_field_order: &[NameField::Last, NameField::First],
};

/// Static lookup over every supported language.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhraseBank;

impl PhraseBank {
    pub fn new() -> Self {
        Self
    }

    pub fn lookup(&self, language: SupportedLanguage) -> &'static LanguageProfile {
        match language {
            SupportedLanguage::En => &ENGLISH,
            SupportedLanguage::Es => &SPANISH,
            SupportedLanguage::Zh => &CHINESE,
        }
    }

    /// Profiles in declaration order.
    pub fn profiles(&self) -> impl Iterator<Item = &'static LanguageProfile> + '_ {
        SupportedLanguage::ALL.into_iter().map(|l| self.lookup(l))
    }
}
