pub mod label_entity;
pub mod mapper;
pub mod migrations;
pub mod sea_orm_repo;
pub mod template_entity;
