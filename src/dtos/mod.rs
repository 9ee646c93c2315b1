//! DTOs module - Data Transfer Objects
//!
//! DTOs separate the API representation from the persisted entities.

pub mod chat;
pub mod document;
pub mod forum;
pub mod query;
pub mod resource;
pub mod retro;
pub mod sprint;
pub mod task;
pub mod user;
pub mod ws_event;

// Re-exports
pub use chat::{ActiveUserDTO, ChatMessageDTO, CreateChatMessageDTO, UpdateChatMessageDTO};
pub use document::{CollaboratorRoleDTO, CreateDocumentDTO, DocumentDTO};
pub use forum::{
    CreateCategoryDTO, CreateReplyDTO, CreateThreadDTO, ThreadDetailsDTO, ThreadListQuery, ThreadSort,
    UpdateReplyDTO, UpdateThreadDTO,
};
pub use query::{DEFAULT_PAGE_SIZE, PageQuery, PageWindow, Paginated, SearchQuery, UserSearchQuery};
pub use resource::{CreateResourceDTO, ResourceFilter, TagsQuery, UpdateResourceDTO};
pub use retro::{
    CreateActionItemDTO, CreateRetroDTO, CreateRetroItemDTO, CreateTemplateDTO, RetroDetailsDTO,
    UpdateActionItemDTO, UpdateRetroItemDTO, UpdateRetroStatusDTO, UpdateTemplateDTO,
};
pub use sprint::{CreateSprintDTO, UpdateSprintDTO};
pub use task::{BoardColumnDTO, BoardDTO, CreateTaskDTO, TaskQuery, UpdateTaskDTO, UpdateTaskStatusDTO};
pub use user::{
    AuthResponseDTO, ChangePasswordDTO, CreateUserDTO, LoginDTO, MessageResponseDTO,
    UpdateProfileDTO, UpdateRoleDTO, UserDTO,
};
pub use ws_event::{ClientEvent, Outbound, ServerEvent};
