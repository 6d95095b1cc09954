//! Create trips table
//!
//! Each trip belongs to one vehicle; vehicles with trips cannot be dropped.
//! The (vehicle_id, departure_at) index serves the overlap search.

use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_vehicles::Vehicles;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Trips::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Trips::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Trips::VehicleId).integer().not_null())
                    .col(ColumnDef::new(Trips::Origin).string_len(50).not_null())
                    .col(ColumnDef::new(Trips::Destination).string_len(50).not_null())
                    .col(
                        ColumnDef::new(Trips::DepartureAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Trips::ArrivalAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Trips::PriceMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Trips::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Trips::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_trips_vehicle")
                            .from(Trips::Table, Trips::VehicleId)
                            .to(Vehicles::Table, Vehicles::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_trips_vehicle_departure")
                    .table(Trips::Table)
                    .col(Trips::VehicleId)
                    .col(Trips::DepartureAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Trips::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Trips {
    Table,
    Id,
    VehicleId,
    Origin,
    Destination,
    DepartureAt,
    ArrivalAt,
    PriceMinor,
    CreatedAt,
    UpdatedAt,
}
