use shared::{
    Player as SharedPlayer, PlayerDetailResponse, PlayerListResponse, PlayerSearchResponse,
    PlayerWithPackage, RegisterPlayerRequest, RegisterPlayerResponse,
};

use super::check_in_mapper::AttendanceMapper;
use super::package_mapper::PackageMapper;
use crate::clock::format_timestamp;
use crate::domain::commands::roster::{
    PlayerDetail, PlayerListResult, PlayerSearchResult, RegisterPlayerCommand,
};
use crate::domain::models::player::Player as DomainPlayer;

/// Mapper to convert between shared Player DTOs and domain Player models.
pub struct PlayerMapper;

impl PlayerMapper {
    pub fn to_dto(domain: DomainPlayer) -> SharedPlayer {
        SharedPlayer {
            id: domain.id,
            first_name: domain.first_name,
            last_name: domain.last_name,
            phone: domain.phone,
            notes: domain.notes,
            created_at: format_timestamp(domain.created_at),
        }
    }

    pub fn to_register_command(dto: RegisterPlayerRequest) -> RegisterPlayerCommand {
        RegisterPlayerCommand {
            first_name: dto.first_name,
            last_name: dto.last_name,
            phone: dto.phone,
            notes: dto.notes,
        }
    }

    pub fn to_register_dto(domain: DomainPlayer) -> RegisterPlayerResponse {
        let success_message = format!(
            "Player {} {} registered successfully.",
            domain.first_name, domain.last_name
        );
        RegisterPlayerResponse { player: Self::to_dto(domain), success_message }
    }

    pub fn to_search_dto(result: PlayerSearchResult) -> PlayerSearchResponse {
        PlayerSearchResponse {
            players: result.players.into_iter().map(Self::to_dto).collect(),
            message: result.message,
        }
    }

    pub fn to_list_dto(result: PlayerListResult) -> PlayerListResponse {
        PlayerListResponse {
            players: result
                .entries
                .into_iter()
                .map(|entry| PlayerWithPackage {
                    player: Self::to_dto(entry.player),
                    active_package: entry.active_package.map(PackageMapper::player_package_to_dto),
                })
                .collect(),
            message: result.message,
        }
    }

    pub fn to_detail_dto(detail: PlayerDetail) -> PlayerDetailResponse {
        PlayerDetailResponse {
            player: Self::to_dto(detail.player),
            active_package: detail.active_package.map(PackageMapper::player_package_to_dto),
            packages: detail
                .packages
                .into_iter()
                .map(PackageMapper::player_package_to_dto)
                .collect(),
            attendance: detail.attendance.into_iter().map(AttendanceMapper::to_dto).collect(),
        }
    }
}
