//! 심각도 레벨 — 순서 기반 비교와 가변 레지스트리
//!
//! [`Level`]은 이름과 고유 ID를 가진 값 타입이고, [`LevelRegistry`]는
//! 레벨들의 현재 순서를 보관하는 명시적 레지스트리입니다.
//! 레벨 간 비교는 타입 자체가 아니라 레지스트리의 **현재 위치**로
//! 결정됩니다. 따라서 레지스트리가 변경되면 같은 두 레벨의 상대 순서도
//! 바뀔 수 있습니다.
//!
//! # 사용 예시
//! ```
//! use logfan_core::level::LevelRegistry;
//!
//! let registry = LevelRegistry::new();
//! let error = registry.error();
//! let fatal = registry.insert_after(&error, "Fatal", Some("즉시 대응 필요")).unwrap();
//!
//! assert!(registry.lt(&error, &fatal));
//! assert_eq!(registry.position(&fatal), Some(3));
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

/// 기본 내장 레벨 이름
const BUILTIN_NAMES: [&str; 3] = ["Info", "Warning", "Error"];

/// 프로세스 전역 ID 카운터 — 레벨 ID는 절대 재사용되지 않습니다.
static NEXT_ID: AtomicU64 = AtomicU64::new(0);

fn fresh_id() -> u64 {
    NEXT_ID.fetch_add(1, AtomicOrdering::Relaxed)
}

/// 심각도 레벨 값 타입
///
/// 생성 시 부여되는 고유 ID로 동일성이 결정됩니다.
/// 순서는 [`LevelRegistry`]의 현재 스냅샷에서 파생되므로
/// `Level` 자체는 `Ord`를 구현하지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Level {
    /// 고유 ID (프로세스 내 순차 부여, 재사용 없음)
    id: u64,
    /// 표시 이름 (레지스트리 내에서 유일)
    name: String,
    /// 설명 (선택)
    description: Option<String>,
}

impl Level {
    fn new(name: impl Into<String>, description: Option<&str>) -> Self {
        Self {
            id: fresh_id(),
            name: name.into(),
            description: description.map(str::to_owned),
        }
    }

    /// 레벨 이름을 반환합니다.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 레벨 설명을 반환합니다.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// 심각도 레벨 레지스트리
///
/// Info, Warning, Error 세 내장 레벨로 시작하는 순서 있는 목록입니다.
/// 기존 레벨 앞뒤로 새 레벨을 삽입할 수 있고, [`reset`](Self::reset)으로
/// 기본 상태로 되돌릴 수 있습니다.
///
/// 전역 상태가 아니라 명시적으로 주입되는 객체이므로, 테스트 간
/// 상태 누수가 없습니다. 비교 연산은 호출 시점의 스냅샷을 읽으며,
/// 동시 삽입과 선형화되지 않습니다 (실사용에서는 단일 스레드 변경을
/// 가정합니다).
#[derive(Debug)]
pub struct LevelRegistry {
    order: RwLock<Vec<Level>>,
}

impl LevelRegistry {
    /// 세 내장 레벨 [Info, Warning, Error]로 초기화된 레지스트리를 생성합니다.
    pub fn new() -> Self {
        Self {
            order: RwLock::new(Self::default_order()),
        }
    }

    fn default_order() -> Vec<Level> {
        BUILTIN_NAMES
            .iter()
            .map(|name| Level::new(*name, None))
            .collect()
    }

    /// `anchor` 바로 앞에 새 레벨을 삽입합니다.
    ///
    /// # Errors
    /// - [`RegistryError::DuplicateName`]: 같은 이름의 레벨이 이미 존재
    /// - [`RegistryError::NotFound`]: `anchor`가 레지스트리에 없음
    pub fn insert_before(
        &self,
        anchor: &Level,
        name: impl Into<String>,
        description: Option<&str>,
    ) -> Result<Level, RegistryError> {
        self.insert_at(anchor, name.into(), description, 0)
    }

    /// `anchor` 바로 뒤에 새 레벨을 삽입합니다.
    ///
    /// # Errors
    /// [`insert_before`](Self::insert_before)와 동일합니다.
    pub fn insert_after(
        &self,
        anchor: &Level,
        name: impl Into<String>,
        description: Option<&str>,
    ) -> Result<Level, RegistryError> {
        self.insert_at(anchor, name.into(), description, 1)
    }

    fn insert_at(
        &self,
        anchor: &Level,
        name: String,
        description: Option<&str>,
        offset: usize,
    ) -> Result<Level, RegistryError> {
        let mut order = self.order.write().expect("level registry lock poisoned");

        if order.iter().any(|level| level.name == name) {
            return Err(RegistryError::DuplicateName { name });
        }

        let index = order
            .iter()
            .position(|level| level == anchor)
            .ok_or_else(|| RegistryError::NotFound {
                name: anchor.name.clone(),
            })?;

        let level = Level::new(name, description);
        order.insert(index + offset, level.clone());

        tracing::debug!(level = %level, position = index + offset, "level inserted");

        Ok(level)
    }

    /// 레지스트리를 세 내장 레벨의 **새 인스턴스**로 원자적으로 교체합니다.
    ///
    /// 이전에 생성된 레벨(기존 Info/Warning/Error 포함)에 대한 참조는
    /// 모두 스테일 상태가 되어, 새 레지스트리 멤버와의 비교는 더 이상
    /// 의미를 갖지 않습니다.
    pub fn reset(&self) {
        let mut order = self.order.write().expect("level registry lock poisoned");
        *order = Self::default_order();
        tracing::debug!("level registry reset to defaults");
    }

    /// 현재 순서의 스냅샷을 반환합니다.
    pub fn order(&self) -> Vec<Level> {
        self.order
            .read()
            .expect("level registry lock poisoned")
            .clone()
    }

    /// 레벨의 현재 위치를 반환합니다. 레지스트리에 없으면 `None`.
    pub fn position(&self, level: &Level) -> Option<usize> {
        self.order
            .read()
            .expect("level registry lock poisoned")
            .iter()
            .position(|member| member == level)
    }

    /// 두 레벨을 현재 순서 기준으로 비교합니다.
    ///
    /// 같은 레벨이면 레지스트리 멤버십과 무관하게 `Some(Equal)`,
    /// 어느 한쪽이라도 레지스트리에 없으면 `None`을 반환합니다.
    pub fn compare(&self, left: &Level, right: &Level) -> Option<Ordering> {
        if left == right {
            return Some(Ordering::Equal);
        }
        let order = self.order.read().expect("level registry lock poisoned");
        let left_pos = order.iter().position(|member| member == left)?;
        let right_pos = order.iter().position(|member| member == right)?;
        Some(left_pos.cmp(&right_pos))
    }

    /// `left < right` — 비교가 정의되지 않으면 `false`.
    pub fn lt(&self, left: &Level, right: &Level) -> bool {
        self.compare(left, right) == Some(Ordering::Less)
    }

    /// `left <= right` — 비교가 정의되지 않으면 `false`.
    pub fn le(&self, left: &Level, right: &Level) -> bool {
        matches!(
            self.compare(left, right),
            Some(Ordering::Less | Ordering::Equal)
        )
    }

    /// `left > right` — 비교가 정의되지 않으면 `false`.
    pub fn gt(&self, left: &Level, right: &Level) -> bool {
        self.compare(left, right) == Some(Ordering::Greater)
    }

    /// `left >= right` — 비교가 정의되지 않으면 `false`.
    pub fn ge(&self, left: &Level, right: &Level) -> bool {
        matches!(
            self.compare(left, right),
            Some(Ordering::Greater | Ordering::Equal)
        )
    }

    /// 이름으로 현재 레지스트리의 레벨을 찾습니다.
    pub fn find(&self, name: &str) -> Option<Level> {
        self.order
            .read()
            .expect("level registry lock poisoned")
            .iter()
            .find(|level| level.name == name)
            .cloned()
    }

    fn builtin(&self, index: usize) -> Level {
        // 내장 레벨은 이름으로 찾는다. reset 후에도 항상 존재한다.
        let name = BUILTIN_NAMES[index];
        self.find(name)
            .unwrap_or_else(|| panic!("builtin level {name} missing from registry"))
    }

    /// 현재 Info 레벨 인스턴스를 반환합니다.
    pub fn info(&self) -> Level {
        self.builtin(0)
    }

    /// 현재 Warning 레벨 인스턴스를 반환합니다.
    pub fn warning(&self) -> Level {
        self.builtin(1)
    }

    /// 현재 Error 레벨 인스턴스를 반환합니다.
    pub fn error(&self) -> Level {
        self.builtin(2)
    }
}

impl Default for LevelRegistry {
    fn default() -> Self {
        Self::new()
    }
}
