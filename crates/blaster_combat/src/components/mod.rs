//! ECS Components для игровых entity
//!
//! Организация по доменам:
//! - character: персонаж (Character, LocallyControlled, CharacterMovement, RotationMode, FollowCamera, SkeletonSockets)
//! - attachment: оружие на socket'е (Attachment, WeaponOwner)

pub mod attachment;
pub mod character;

// Re-exports для удобного импорта
pub use attachment::*;
pub use character::*;
