use shared::{
    format_cents, ActivePackageResponse, Package as SharedPackage, PackageCatalogResponse,
    PlayerPackage as SharedPlayerPackage, SellPackageRequest, SellPackageResponse,
};

use crate::clock::format_timestamp;
use crate::domain::commands::sales::{SellPackageCommand, SellPackageResult};
use crate::domain::models::package::{CatalogPackage, PlayerPackage};

/// Mapper for catalog packages and player purchases.
pub struct PackageMapper;

impl PackageMapper {
    pub fn catalog_to_dto(domain: CatalogPackage) -> SharedPackage {
        SharedPackage {
            formatted_price: format_cents(domain.price_cents),
            id: domain.id,
            name: domain.name,
            sessions_included: domain.sessions_included,
            price_cents: domain.price_cents,
        }
    }

    pub fn player_package_to_dto(domain: PlayerPackage) -> SharedPlayerPackage {
        SharedPlayerPackage {
            sessions_remaining: domain.sessions_remaining(),
            id: domain.id,
            player_id: domain.player_id,
            package_id: domain.package_id,
            sessions_total: domain.sessions_total,
            sessions_used: domain.sessions_used,
            price_cents: domain.price_cents,
            purchased_at: format_timestamp(domain.purchased_at),
        }
    }

    pub fn to_catalog_dto(packages: Vec<CatalogPackage>) -> PackageCatalogResponse {
        PackageCatalogResponse { packages: packages.into_iter().map(Self::catalog_to_dto).collect() }
    }

    pub fn to_active_package_dto(active: Option<PlayerPackage>) -> ActivePackageResponse {
        ActivePackageResponse { active_package: active.map(Self::player_package_to_dto) }
    }

    pub fn to_sell_command(dto: SellPackageRequest) -> SellPackageCommand {
        SellPackageCommand { player_id: dto.player_id, package_id: dto.package_id }
    }

    pub fn to_sell_dto(result: SellPackageResult) -> SellPackageResponse {
        SellPackageResponse {
            player_package: Self::player_package_to_dto(result.player_package),
            success_message: result.success_message,
        }
    }
}
