//! Result ordering.
//!
//! Every ordering ends with the vulnerability id ascending so that the order is
//! total and pages never overlap or skip rows.
//!
//! Text keys sort under the `C` collation (byte order), which is also how Rust
//! orders `str`, so the result does not depend on the database locale.

use std::cmp::Ordering;

use super::error::QueryError;
use crate::models::VulnerabilityRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    CreatedAt,
    UpdatedAt,
    Title,
    Severity,
    State,
    Cvss,
    Domain,
}

impl SortKey {
    pub fn parse(raw: &str) -> Result<Self, QueryError> {
        match raw {
            "createdAt" => Ok(Self::CreatedAt),
            "updatedAt" => Ok(Self::UpdatedAt),
            "title" => Ok(Self::Title),
            "severity" => Ok(Self::Severity),
            "state" => Ok(Self::State),
            "cvss" => Ok(Self::Cvss),
            "domain" => Ok(Self::Domain),
            other => Err(QueryError::InvalidSort(format!(
                "unknown sort key '{}'",
                other
            ))),
        }
    }

    /// SQL expression for this key. Only ever one of these fixed strings.
    pub fn column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "v.created_at",
            Self::UpdatedAt => "v.updated_at",
            Self::Title => r#"v.title COLLATE "C""#,
            Self::Severity => r#"v.severity COLLATE "C""#,
            Self::State => r#"v.state COLLATE "C""#,
            Self::Cvss => "v.cvss",
            Self::Domain => r#"d.name COLLATE "C""#,
        }
    }

    fn compare(&self, a: &VulnerabilityRecord, b: &VulnerabilityRecord) -> Ordering {
        let (va, vb) = (&a.vulnerability, &b.vulnerability);
        match self {
            Self::CreatedAt => va.created_at.cmp(&vb.created_at),
            Self::UpdatedAt => va.updated_at.cmp(&vb.updated_at),
            Self::Title => va.title.cmp(&vb.title),
            Self::Severity => nulls_last(va.severity.as_ref(), vb.severity.as_ref(), Ord::cmp),
            Self::State => va.state.cmp(&vb.state),
            Self::Cvss => nulls_last(va.cvss.as_ref(), vb.cvss.as_ref(), |x, y| x.total_cmp(y)),
            Self::Domain => a.domain.name.cmp(&b.domain.name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn parse(raw: &str) -> Result<Self, QueryError> {
        if raw.eq_ignore_ascii_case("asc") {
            Ok(Self::Asc)
        } else if raw.eq_ignore_ascii_case("desc") {
            Ok(Self::Desc)
        } else {
            Err(QueryError::InvalidSort(format!(
                "order must be ASC or DESC, got '{}'",
                raw
            )))
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Sort key plus direction. Defaults to newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortOrder {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortOrder {
    pub fn parse(sort: Option<&str>, order: Option<&str>) -> Result<Self, QueryError> {
        Ok(Self {
            key: sort.map(SortKey::parse).transpose()?.unwrap_or_default(),
            direction: order
                .map(SortDirection::parse)
                .transpose()?
                .unwrap_or_default(),
        })
    }

    /// `ORDER BY` body, e.g. `v.created_at DESC, v.id ASC`.
    pub fn to_sql(&self) -> String {
        format!(
            "{} {}, v.id ASC",
            self.key.column(),
            self.direction.as_sql()
        )
    }

    /// Comparator equivalent to [`Self::to_sql`]: byte order for text, and
    /// PostgreSQL's default null placement (nulls are larger than every value).
    pub fn compare(&self, a: &VulnerabilityRecord, b: &VulnerabilityRecord) -> Ordering {
        let primary = match self.direction {
            SortDirection::Asc => self.key.compare(a, b),
            SortDirection::Desc => self.key.compare(a, b).reverse(),
        };
        primary.then_with(|| a.vulnerability.id.cmp(&b.vulnerability.id))
    }
}

fn nulls_last<T>(a: Option<&T>, b: Option<&T>, cmp: impl Fn(&T, &T) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => cmp(x, y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
