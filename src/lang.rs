use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Tr,
    En,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::Tr, Language::En];

    pub fn code(self) -> &'static str {
        match self {
            Language::Tr => "tr",
            Language::En => "en",
        }
    }

    pub fn labels(self) -> &'static Labels {
        match self {
            Language::Tr => &TR,
            Language::En => &EN,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Language::Tr => Language::En,
            Language::En => Language::Tr,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tr" => Ok(Language::Tr),
            "en" => Ok(Language::En),
            other => Err(format!("unknown language '{}' (expected tr or en)", other)),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct Labels {
    pub language_name: &'static str,
    pub settings: &'static str,
    pub name: &'static str,
    pub username: &'static str,
    pub tweet: &'static str,
    pub avatar: &'static str,
    pub retweets: &'static str,
    pub quote_tweets: &'static str,
    pub likes: &'static str,
    pub verified: &'static str,
    pub yes: &'static str,
    pub no: &'static str,
    pub create: &'static str,
    pub download: &'static str,
    pub fetch: &'static str,
    pub fetch_hint: &'static str,
    pub name_placeholder: &'static str,
    pub username_placeholder: &'static str,
    pub body_placeholder: &'static str,
    pub avatar_hint: &'static str,
    pub preview: &'static str,
    pub key_help: &'static str,
    pub status_need_handle: &'static str,
    pub status_looking_up: &'static str,
    pub status_profile_loaded: &'static str,
    pub status_lookup_failed: &'static str,
    pub status_avatar_updated: &'static str,
    pub status_avatar_failed: &'static str,
    pub status_rendering: &'static str,
    pub status_saved: &'static str,
    pub status_capture_failed: &'static str,
    pub status_export_failed: &'static str,
}

static TR: Labels = Labels {
    language_name: "Türkçe",
    settings: "Tweet Ayarları",
    name: "Ad Soyad",
    username: "Kullanıcı Adı",
    tweet: "Tweet",
    avatar: "Avatar",
    retweets: "Retweet",
    quote_tweets: "Alıntı Tweetler",
    likes: "Beğeni",
    verified: "Doğrulanmış Hesap",
    yes: "Evet",
    no: "Hayır",
    create: "Oluştur",
    download: "Tweeti İndir",
    fetch: "Bilgileri Çek",
    fetch_hint: "Twitter kullanıcı adını yazın",
    name_placeholder: "Ad Soyad",
    username_placeholder: "KullanıcıAdi",
    body_placeholder: "Bu alana örnek tweet gelecek",
    avatar_hint: "Resim dosyasının yolu, Enter ile yükle",
    preview: "Önizleme",
    key_help: "Tab: alan  Ctrl+F: bilgileri çek  Ctrl+S: oluştur  Ctrl+L: dil  Esc: mesajı kapat / çıkış",
    status_need_handle: "Önce bir kullanıcı adı yazın",
    status_looking_up: "Aranıyor:",
    status_profile_loaded: "Profil yüklendi",
    status_lookup_failed: "Bilgiler alınamadı",
    status_avatar_updated: "Avatar güncellendi",
    status_avatar_failed: "Avatar değiştirilemedi",
    status_rendering: "Görsel oluşturuluyor",
    status_saved: "Kaydedildi",
    status_capture_failed: "Görsel oluşturulamadı",
    status_export_failed: "Dosya yazılamadı",
};

static EN: Labels = Labels {
    language_name: "English",
    settings: "Tweet Settings",
    name: "Name",
    username: "Username",
    tweet: "Tweet",
    avatar: "Avatar",
    retweets: "Retweets",
    quote_tweets: "Quote Tweets",
    likes: "Likes",
    verified: "Verified Account",
    yes: "Yes",
    no: "No",
    create: "Create",
    download: "Download Tweet",
    fetch: "Fetch Info",
    fetch_hint: "Type a Twitter username",
    name_placeholder: "Full Name",
    username_placeholder: "username",
    body_placeholder: "Your sample tweet will appear here",
    avatar_hint: "Path to an image file, Enter to load",
    preview: "Preview",
    key_help: "Tab: field  Ctrl+F: fetch info  Ctrl+S: create  Ctrl+L: language  Esc: dismiss / quit",
    status_need_handle: "Type a handle before fetching",
    status_looking_up: "Looking up",
    status_profile_loaded: "Profile loaded",
    status_lookup_failed: "Lookup failed",
    status_avatar_updated: "Avatar updated",
    status_avatar_failed: "Avatar not changed",
    status_rendering: "Rendering capture",
    status_saved: "Saved",
    status_capture_failed: "Capture failed",
    status_export_failed: "Export failed",
};
