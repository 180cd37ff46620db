//! Section schemas and their hardcoded defaults.
//!
//! Each document key owns a fixed list of sections ([`schema_for`]). A
//! section's schema is a serde struct; a stored value satisfies the schema
//! when it deserializes into that struct. Defaults are the struct defaults
//! serialized back to JSON, so the two can never drift apart.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::identity::Role;
use crate::types::{ContentDocument, DocumentKey, SubsidiaryId};

// ---------------------------------------------------------------------------
// Section kinds
// ---------------------------------------------------------------------------

/// Every section the content model knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    HomeHero,
    Achievements,
    Group,
    SubsidiaryDirectory,
    Stats,
    NewsItems,
    ImageLibrary,
    UserAccounts,
    SubsidiaryHero,
    SubsidiaryAbout,
    SubsidiaryServices,
    SubsidiaryContact,
}

const HOME_SECTIONS: &[SectionKind] = &[
    SectionKind::HomeHero,
    SectionKind::Achievements,
    SectionKind::Group,
    SectionKind::SubsidiaryDirectory,
    SectionKind::Stats,
];
const NEWS_SECTIONS: &[SectionKind] = &[SectionKind::NewsItems];
const IMAGE_SECTIONS: &[SectionKind] = &[SectionKind::ImageLibrary];
const USER_SECTIONS: &[SectionKind] = &[SectionKind::UserAccounts];
const SUBSIDIARY_SECTIONS: &[SectionKind] = &[
    SectionKind::SubsidiaryHero,
    SectionKind::SubsidiaryAbout,
    SectionKind::SubsidiaryServices,
    SectionKind::SubsidiaryContact,
];

/// Sections stored under `key`, in display order.
///
/// The proposal ledger has its own typed shape and no sections.
pub fn schema_for(key: &DocumentKey) -> &'static [SectionKind] {
    match key {
        DocumentKey::Home => HOME_SECTIONS,
        DocumentKey::News => NEWS_SECTIONS,
        DocumentKey::Images => IMAGE_SECTIONS,
        DocumentKey::Users => USER_SECTIONS,
        DocumentKey::Proposals => &[],
        DocumentKey::Subsidiary(_) => SUBSIDIARY_SECTIONS,
    }
}

/// Look up a section of `key` by its wire name.
pub fn section_kind(key: &DocumentKey, name: &str) -> Option<SectionKind> {
    schema_for(key).iter().copied().find(|kind| kind.name() == name)
}

/// The full default document for `key`.
pub fn default_document(key: &DocumentKey) -> ContentDocument {
    let mut doc = ContentDocument::new();
    for kind in schema_for(key) {
        doc.set_section(kind.name(), kind.default_value(key));
    }
    doc
}

impl SectionKind {
    /// Wire name of the section inside its document.
    pub fn name(self) -> &'static str {
        match self {
            SectionKind::HomeHero | SectionKind::SubsidiaryHero => "hero",
            SectionKind::Achievements => "achievements",
            SectionKind::Group => "group",
            SectionKind::SubsidiaryDirectory => "subsidiaries",
            SectionKind::Stats => "stats",
            SectionKind::NewsItems => "items",
            SectionKind::ImageLibrary => "library",
            SectionKind::UserAccounts => "accounts",
            SectionKind::SubsidiaryAbout => "about",
            SectionKind::SubsidiaryServices => "services",
            SectionKind::SubsidiaryContact => "contact",
        }
    }

    /// List-valued sections are replaced wholesale, never field-merged.
    pub fn is_list(self) -> bool {
        matches!(
            self,
            SectionKind::Achievements
                | SectionKind::SubsidiaryDirectory
                | SectionKind::NewsItems
                | SectionKind::ImageLibrary
                | SectionKind::UserAccounts
                | SectionKind::SubsidiaryServices
        )
    }

    /// Hardcoded default value of this section for `key`.
    pub fn default_value(self, key: &DocumentKey) -> Value {
        let profile = key.subsidiary().map(SubsidiaryProfile::for_id);
        let profile = profile.as_ref();
        match self {
            SectionKind::HomeHero => to_json(HomeHero::default()),
            SectionKind::Achievements => to_json(default_achievements()),
            SectionKind::Group => to_json(GroupIntro::default()),
            SectionKind::SubsidiaryDirectory => to_json(default_directory()),
            SectionKind::Stats => to_json(Stats::default()),
            SectionKind::NewsItems => to_json(default_news()),
            SectionKind::ImageLibrary => to_json(Vec::<ImageRef>::new()),
            SectionKind::UserAccounts => to_json(default_accounts()),
            SectionKind::SubsidiaryHero => to_json(profile.map(SubsidiaryHero::from_profile)),
            SectionKind::SubsidiaryAbout => to_json(profile.map(About::from_profile)),
            SectionKind::SubsidiaryServices => {
                to_json(profile.map(|p| p.services()).unwrap_or_default())
            }
            SectionKind::SubsidiaryContact => to_json(profile.map(Contact::from_profile)),
        }
    }

    /// Check `value` against the section schema.
    pub fn check(self, value: &Value) -> Result<(), serde_json::Error> {
        match self {
            SectionKind::HomeHero => conforms::<HomeHero>(value),
            SectionKind::Achievements => conforms::<Vec<Achievement>>(value),
            SectionKind::Group => conforms::<GroupIntro>(value),
            SectionKind::SubsidiaryDirectory => conforms::<Vec<SubsidiaryCard>>(value),
            SectionKind::Stats => conforms::<Stats>(value),
            SectionKind::NewsItems => conforms::<Vec<NewsItem>>(value),
            SectionKind::ImageLibrary => conforms::<Vec<ImageRef>>(value),
            SectionKind::UserAccounts => conforms::<Vec<UserAccount>>(value),
            SectionKind::SubsidiaryHero => conforms::<SubsidiaryHero>(value),
            SectionKind::SubsidiaryAbout => conforms::<About>(value),
            SectionKind::SubsidiaryServices => conforms::<Vec<Service>>(value),
            SectionKind::SubsidiaryContact => conforms::<Contact>(value),
        }
    }
}

fn conforms<T: DeserializeOwned>(value: &Value) -> Result<(), serde_json::Error> {
    T::deserialize(value).map(|_| ())
}

fn to_json<T: Serialize>(value: T) -> Value {
    serde_json::to_value(value).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Schemas
// ---------------------------------------------------------------------------

/// Opaque image record supplied by the image pipeline.
///
/// Stored and republished as-is; the only requirement is that it is a JSON
/// object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(pub serde_json::Map<String, Value>);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeHero {
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub cta_text: String,
    pub cta_link: String,
    pub background_image: Option<ImageRef>,
}

impl Default for HomeHero {
    fn default() -> Self {
        Self {
            title: "정호그룹".into(),
            subtitle: "신뢰로 짓고, 혁신으로 잇습니다".into(),
            description: "정호그룹은 건설, 물류, 기술 분야에서 고객과 함께 성장해 온 종합 기업입니다."
                .into(),
            cta_text: "그룹 소개 보기".into(),
            cta_link: "/about".into(),
            background_image: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub value: String,
    pub label: String,
    pub description: String,
}

fn default_achievements() -> Vec<Achievement> {
    [
        ("40+", "업력", "1985년 창립 이후 이어온 경험"),
        ("1,200+", "완료 프로젝트", "국내외 건설 및 물류 프로젝트"),
        ("3", "계열사", "건설 · 물류 · 기술"),
    ]
    .into_iter()
    .map(|(value, label, description)| Achievement {
        value: value.into(),
        label: label.into(),
        description: description.into(),
    })
    .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupIntro {
    pub title: String,
    pub description: String,
}

impl Default for GroupIntro {
    fn default() -> Self {
        Self {
            title: "정호그룹 소개".into(),
            description: "1985년 창립 이래 정호그룹은 건설·물류·기술 세 축을 중심으로 지속 가능한 성장을 이어가고 있습니다."
                .into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsidiaryCard {
    pub id: SubsidiaryId,
    pub name: String,
    pub description: String,
    pub link: String,
    pub logo: Option<ImageRef>,
}

/// Group companies that have their own default copy.
pub fn known_subsidiaries() -> Vec<SubsidiaryId> {
    SubsidiaryProfile::KNOWN
        .iter()
        .filter_map(|id| SubsidiaryId::new(*id).ok())
        .collect()
}

fn default_directory() -> Vec<SubsidiaryCard> {
    known_subsidiaries()
        .into_iter()
        .map(|id| {
            let profile = SubsidiaryProfile::for_id(&id);
            SubsidiaryCard {
                link: format!("/subsidiaries/{id}"),
                name: profile.name.clone(),
                description: profile.tagline.clone(),
                logo: None,
                id,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub founded: String,
    pub subsidiaries: u32,
    pub employees: u32,
    pub revenue: String,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            founded: "1985".into(),
            subsidiaries: 3,
            employees: 1800,
            revenue: "1조 2천억원".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub id: u64,
    pub title: String,
    pub summary: String,
    pub content: String,
    pub category: String,
    pub published_at: String,
    pub image: Option<ImageRef>,
}

fn default_news() -> Vec<NewsItem> {
    vec![NewsItem {
        id: 1,
        title: "정호그룹 홈페이지가 새롭게 오픈했습니다".into(),
        summary: "그룹과 계열사 소식을 한곳에서 확인하세요.".into(),
        content: "정호그룹 통합 홈페이지가 새롭게 단장했습니다. 계열사별 소개와 최신 소식을 제공합니다."
            .into(),
        category: "공지".into(),
        published_at: "2024-01-02".into(),
        image: None,
    }]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub username: String,
    pub display_name: String,
    pub role: Role,
    pub department: Option<SubsidiaryId>,
}

fn default_accounts() -> Vec<UserAccount> {
    vec![UserAccount {
        username: "admin".into(),
        display_name: "관리자".into(),
        role: Role::SuperAdmin,
        department: None,
    }]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubsidiaryHero {
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub background_image: Option<ImageRef>,
}

impl SubsidiaryHero {
    fn from_profile(profile: &SubsidiaryProfile) -> Self {
        Self {
            title: profile.name.clone(),
            subtitle: profile.tagline.clone(),
            description: format!("{}의 사업과 비전을 소개합니다.", profile.name),
            background_image: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct About {
    pub title: String,
    pub description: String,
}

impl About {
    fn from_profile(profile: &SubsidiaryProfile) -> Self {
        Self {
            title: format!("{} 소개", profile.name),
            description: format!("{}는 정호그룹의 계열사입니다.", profile.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub address: String,
    pub phone: String,
    pub email: String,
    pub fax: Option<String>,
    pub hours: String,
}

impl Contact {
    fn from_profile(profile: &SubsidiaryProfile) -> Self {
        Self {
            address: "서울특별시 중구 세종대로 110".into(),
            phone: "02-000-0000".into(),
            email: format!("info@{}.jeongho.co.kr", profile.id),
            fax: None,
            hours: "평일 09:00 - 18:00".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Subsidiary profiles
// ---------------------------------------------------------------------------

/// Copy used to seed a subsidiary's default sections.
struct SubsidiaryProfile {
    id: SubsidiaryId,
    name: String,
    tagline: String,
}

impl SubsidiaryProfile {
    const KNOWN: &'static [&'static str] = &["construction", "logistics", "tech"];

    fn for_id(id: &SubsidiaryId) -> Self {
        let (name, tagline) = match id.as_str() {
            "construction" => ("정호건설", "안전과 품질로 완성하는 공간"),
            "logistics" => ("정호물류", "빠르고 정확한 물류 파트너"),
            "tech" => ("정호테크", "현장을 바꾸는 기술"),
            other => (other, ""),
        };
        Self {
            id: id.clone(),
            name: name.to_string(),
            tagline: tagline.to_string(),
        }
    }

    fn services(&self) -> Vec<Service> {
        let items: &[(&str, &str)] = match self.id.as_str() {
            "construction" => &[
                ("건축", "주거 및 상업 시설 시공"),
                ("토목", "도로 · 교량 인프라 구축"),
            ],
            "logistics" => &[
                ("창고 운영", "전국 거점 물류 센터"),
                ("운송", "화물 운송 및 배송 관리"),
            ],
            "tech" => &[
                ("스마트 건설", "BIM 및 현장 자동화 솔루션"),
                ("IT 서비스", "그룹 정보 시스템 운영"),
            ],
            _ => &[],
        };
        items
            .iter()
            .map(|(title, description)| Service {
                title: (*title).into(),
                description: (*description).into(),
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn all_keys() -> Vec<DocumentKey> {
        let mut keys = DocumentKey::fixed().to_vec();
        keys.push("subsidiary.construction".parse().unwrap());
        keys.push("subsidiary.unknown-co".parse().unwrap());
        keys
    }

    #[test]
    fn every_default_conforms_to_its_schema() {
        for key in all_keys() {
            for kind in schema_for(&key) {
                let value = kind.default_value(&key);
                kind.check(&value)
                    .unwrap_or_else(|e| panic!("{key}.{} default invalid: {e}", kind.name()));
            }
        }
    }

    #[test]
    fn group_default_title() {
        let group = SectionKind::Group.default_value(&DocumentKey::Home);
        assert_eq!(group["title"], "정호그룹 소개");
        assert!(group["description"].as_str().is_some_and(|d| !d.is_empty()));
    }

    #[test]
    fn list_sections_default_to_arrays() {
        for key in all_keys() {
            for kind in schema_for(&key) {
                assert_eq!(
                    kind.default_value(&key).is_array(),
                    kind.is_list(),
                    "{key}.{}",
                    kind.name()
                );
            }
        }
    }

    #[test]
    fn unknown_subsidiary_gets_neutral_defaults() {
        let key: DocumentKey = "subsidiary.unknown-co".parse().unwrap();
        let doc = default_document(&key);
        assert_eq!(doc.section("hero").unwrap()["title"], "unknown-co");
        assert_eq!(doc.section("services").unwrap(), &Value::Array(vec![]));
    }

    #[test]
    fn wrong_field_type_fails_check() {
        let bad = serde_json::json!({ "title": 5, "description": "x" });
        assert!(SectionKind::Group.check(&bad).is_err());
        assert!(SectionKind::Achievements.check(&serde_json::json!({})).is_err());
    }

    #[test]
    fn proposals_have_no_sections() {
        assert!(default_document(&DocumentKey::Proposals).is_empty());
    }
}
