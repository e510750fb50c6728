//! Parsing of workbook rows into a fully resolved, in-memory import.

use std::collections::{HashMap, HashSet, hash_map::Entry};

use calamine::Data;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::{
    ImportError, ImportOptions,
    items::parse_items_spec,
    workbook::{self, ORDER_SHEET, PRODUCT_SHEET, Row, USER_SHEET, Workbook},
};
use crate::{
    models::{Role, price_to_minor},
    services::auth_service::{UNUSABLE_PASSWORD, hash_password},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickupPointRecord {
    /// 1-based position among the data rows; orders refer to pickup points by it.
    pub position: usize,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub login: String,
    pub password_hash: String,
    pub role: Role,
    pub last_name: String,
    pub first_name: String,
    pub patronymic: String,
    pub is_staff: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRecord {
    pub sku: String,
    pub name: String,
    pub unit: String,
    pub price_minor: i64,
    pub supplier: String,
    pub manufacturer: String,
    pub category: String,
    pub discount: i32,
    pub stock: i32,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRecord {
    pub order_id: i32,
    pub order_date: NaiveDate,
    pub delivery_date: NaiveDate,
    pub pickup_position: usize,
    /// Index into [`ImportDataset::users`].
    pub client: Option<usize>,
    pub code: i32,
    pub status: String,
    pub items: Vec<(String, i32)>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportDataset {
    pub pickup_points: Vec<PickupPointRecord>,
    pub users: Vec<UserRecord>,
    pub products: Vec<ProductRecord>,
    pub orders: Vec<OrderRecord>,
    /// Client names shared by several users; orders naming them get no client.
    pub ambiguous_clients: Vec<String>,
    pub skipped_items: usize,
}

/// Role labels used in the user sheet.
const ROLE_LABELS: [(&str, Role); 4] = [
    ("Администратор", Role::Admin),
    ("Менеджер", Role::Manager),
    ("Клиент", Role::Client),
    ("Гость", Role::Guest),
];

pub fn role_from_label(label: &str) -> Role {
    ROLE_LABELS
        .iter()
        .find(|(known, _)| *known == label)
        .map(|(_, role)| *role)
        .unwrap_or(Role::Guest)
}

/// "surname [given [patronymic]]" into its three parts; missing parts are empty.
pub fn split_full_name(full_name: &str) -> (String, String, String) {
    let mut parts = full_name.split_whitespace();
    let mut next = || parts.next().unwrap_or_default().to_string();
    let last_name = next();
    let first_name = next();
    let patronymic = next();
    (last_name, first_name, patronymic)
}

#[derive(Debug, Clone, Copy)]
enum ClientRef {
    Unique(usize),
    Ambiguous,
}

impl ImportDataset {
    pub fn parse(workbook: &Workbook, options: &ImportOptions) -> Result<Self, ImportError> {
        let mut dataset = ImportDataset::default();

        for row in workbook.pickup_points.rows() {
            let Some(address) = workbook::text(row.cell(0)) else {
                continue;
            };
            dataset.pickup_points.push(PickupPointRecord {
                position: row.number - 1,
                address,
            });
        }

        let clients = dataset.parse_users(workbook)?;
        dataset.parse_products(workbook)?;
        dataset.parse_orders(workbook, &clients, options)?;
        Ok(dataset)
    }

    fn parse_users(&mut self, workbook: &Workbook) -> Result<HashMap<String, ClientRef>, ImportError> {
        let mut clients: HashMap<String, ClientRef> = HashMap::new();
        let mut logins = HashSet::new();

        for row in workbook.users.rows() {
            let Some(login) = workbook::text(row.cell(2)) else {
                continue;
            };
            if !logins.insert(login.clone()) {
                return Err(malformed(USER_SHEET, row, format!("duplicate login {login:?}")));
            }
            let role = role_from_label(&workbook::text(row.cell(0)).unwrap_or_default());
            let full_name = workbook::text(row.cell(1)).unwrap_or_default();
            let (last_name, first_name, patronymic) = split_full_name(&full_name);
            let password_hash = match workbook::text(row.cell(3)) {
                Some(password) => hash_password(&password)
                    .map_err(|err| ImportError::Credential(err.to_string()))?,
                None => UNUSABLE_PASSWORD.to_string(),
            };

            let index = self.users.len();
            self.users.push(UserRecord {
                login,
                password_hash,
                role,
                last_name,
                first_name,
                patronymic,
                is_staff: role.is_staff(),
            });

            if full_name.is_empty() {
                continue;
            }
            match clients.entry(full_name) {
                Entry::Vacant(slot) => {
                    slot.insert(ClientRef::Unique(index));
                }
                Entry::Occupied(mut slot) => {
                    if matches!(slot.get(), ClientRef::Unique(_)) {
                        tracing::warn!(name = %slot.key(), "several users share this display name");
                        self.ambiguous_clients.push(slot.key().clone());
                    }
                    slot.insert(ClientRef::Ambiguous);
                }
            }
        }
        Ok(clients)
    }

    fn parse_products(&mut self, workbook: &Workbook) -> Result<(), ImportError> {
        let mut skus = HashSet::new();

        for row in workbook.products.rows() {
            let Some(sku) = workbook::text(row.cell(0)) else {
                continue;
            };
            if !skus.insert(sku.clone()) {
                return Err(malformed(PRODUCT_SHEET, row, format!("duplicate SKU {sku:?}")));
            }
            let price = workbook::decimal(row.cell(3))
                .map_err(|reason| malformed(PRODUCT_SHEET, row, reason))?
                .unwrap_or_default();
            if price < Decimal::ZERO {
                return Err(malformed(PRODUCT_SHEET, row, format!("negative price {price}")));
            }
            let price_minor = price_to_minor(price)
                .ok_or_else(|| malformed(PRODUCT_SHEET, row, format!("price {price} is out of range")))?;

            self.products.push(ProductRecord {
                sku,
                name: text_or_empty(row.cell(1)),
                unit: text_or_empty(row.cell(2)),
                price_minor,
                supplier: text_or_empty(row.cell(4)),
                manufacturer: text_or_empty(row.cell(5)),
                category: text_or_empty(row.cell(6)),
                discount: small_integer(PRODUCT_SHEET, row, 7)?.unwrap_or(0),
                stock: small_integer(PRODUCT_SHEET, row, 8)?.unwrap_or(0),
                description: text_or_empty(row.cell(9)),
            });
        }
        Ok(())
    }

    fn parse_orders(
        &mut self,
        workbook: &Workbook,
        clients: &HashMap<String, ClientRef>,
        options: &ImportOptions,
    ) -> Result<(), ImportError> {
        let skus: HashSet<&str> = self.products.iter().map(|p| p.sku.as_str()).collect();
        let positions: HashSet<usize> = self.pickup_points.iter().map(|p| p.position).collect();
        let mut order_ids = HashSet::new();
        let mut orders = Vec::new();
        let mut skipped_items = 0;

        for row in workbook.orders.rows() {
            // The first row without an order number ends the table.
            let Some(order_id) = small_integer(ORDER_SHEET, row, 0)? else {
                break;
            };
            if !order_ids.insert(order_id) {
                return Err(malformed(ORDER_SHEET, row, format!("duplicate order {order_id}")));
            }

            let order_date = required_date(row, 2, "order date")?;
            let delivery_date = required_date(row, 3, "delivery date")?;

            let pickup_position = small_integer(ORDER_SHEET, row, 4)?
                .and_then(|position| usize::try_from(position).ok())
                .filter(|position| positions.contains(position))
                .ok_or_else(|| {
                    malformed(ORDER_SHEET, row, format!("unknown pickup point {:?}", row.cell(4)))
                })?;

            let client = match workbook::text(row.cell(5)) {
                None => None,
                Some(name) => match clients.get(&name) {
                    Some(ClientRef::Unique(index)) => Some(*index),
                    Some(ClientRef::Ambiguous) if options.strict_items => {
                        return Err(malformed(
                            ORDER_SHEET,
                            row,
                            format!("client name {name:?} matches several users"),
                        ));
                    }
                    Some(ClientRef::Ambiguous) => {
                        tracing::warn!(order_id, name = %name, "ambiguous client name, order left without client");
                        None
                    }
                    None => None,
                },
            };

            let code = small_integer(ORDER_SHEET, row, 6)?
                .ok_or_else(|| malformed(ORDER_SHEET, row, "missing pickup code".into()))?;
            let status = workbook::text(row.cell(7))
                .ok_or_else(|| malformed(ORDER_SHEET, row, "missing status".into()))?;

            let spec = parse_items_spec(&text_or_empty(row.cell(1)))
                .map_err(|reason| malformed(ORDER_SHEET, row, reason))?;
            if let Some(token) = spec.trailing {
                if options.strict_items {
                    return Err(malformed(
                        ORDER_SHEET,
                        row,
                        format!("item {token:?} has no quantity"),
                    ));
                }
                tracing::debug!(order_id, token = %token, "dropping item without quantity");
            }
            let mut items = Vec::with_capacity(spec.pairs.len());
            for (sku, quantity) in spec.pairs {
                if skus.contains(sku.as_str()) {
                    items.push((sku, quantity));
                } else if options.strict_items {
                    return Err(malformed(ORDER_SHEET, row, format!("unknown SKU {sku:?}")));
                } else {
                    tracing::debug!(order_id, sku = %sku, "skipping item with unknown SKU");
                    skipped_items += 1;
                }
            }

            orders.push(OrderRecord {
                order_id,
                order_date,
                delivery_date,
                pickup_position,
                client,
                code,
                status,
                items,
            });
        }

        self.orders = orders;
        self.skipped_items = skipped_items;
        Ok(())
    }
}

fn malformed(sheet: &'static str, row: &Row, reason: String) -> ImportError {
    ImportError::MalformedRow {
        sheet,
        row: row.number,
        reason,
    }
}

fn text_or_empty(cell: &Data) -> String {
    workbook::text(cell).unwrap_or_default()
}

fn small_integer(sheet: &'static str, row: &Row, column: usize) -> Result<Option<i32>, ImportError> {
    match workbook::integer(row.cell(column)).map_err(|reason| malformed(sheet, row, reason))? {
        None => Ok(None),
        Some(value) => i32::try_from(value)
            .map(Some)
            .map_err(|_| malformed(sheet, row, format!("{value} is out of range"))),
    }
}

fn required_date(row: &Row, column: usize, what: &str) -> Result<NaiveDate, ImportError> {
    workbook::date(row.cell(column))
        .map_err(|reason| malformed(ORDER_SHEET, row, reason))?
        .ok_or_else(|| malformed(ORDER_SHEET, row, format!("missing {what}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::workbook::Sheet;

    fn s(value: &str) -> Data {
        Data::String(value.to_string())
    }

    fn order_row(id: f64, items: &str, pickup: f64, client: &str) -> Vec<Data> {
        vec![
            Data::Float(id),
            s(items),
            s("2024-02-27"),
            s("2024-03-02"),
            Data::Float(pickup),
            s(client),
            Data::Float(901.0),
            s("Новый"),
        ]
    }

    fn workbook() -> Workbook {
        Workbook {
            pickup_points: Sheet::from_rows(vec![
                vec![s("420151, Lesnaya 1")],
                vec![Data::Empty],
                vec![s("125061, Lenina 8")],
            ]),
            users: Sheet::from_rows(vec![
                vec![s("Клиент"), s("Petrov Petr Petrovich"), s("petrov"), Data::Empty],
                vec![s("Менеджер"), s("Ivanova Anna"), s("ivanova"), Data::Empty],
            ]),
            products: Sheet::from_rows(vec![vec![
                s("A1"),
                s("Boots"),
                s("pcs"),
                Data::Float(100.0),
                s("Acme"),
                s("Kari"),
                s("Shoes"),
                Data::Float(10.0),
                Data::Float(5.0),
                s("Winter boots"),
            ]]),
            orders: Sheet::default(),
        }
    }

    #[test]
    fn role_labels_map_to_roles() {
        assert_eq!(role_from_label("Администратор"), Role::Admin);
        assert_eq!(role_from_label("Менеджер"), Role::Manager);
        assert_eq!(role_from_label("Клиент"), Role::Client);
        assert_eq!(role_from_label("Superuser"), Role::Guest);
        assert_eq!(role_from_label(""), Role::Guest);
    }

    #[test]
    fn full_name_splits_into_three_parts() {
        assert_eq!(
            split_full_name("Nikiforova  Vesenia Nikolaevna"),
            ("Nikiforova".into(), "Vesenia".into(), "Nikolaevna".into())
        );
        assert_eq!(
            split_full_name("Stepanov"),
            ("Stepanov".into(), String::new(), String::new())
        );
        assert_eq!(split_full_name(""), (String::new(), String::new(), String::new()));
    }

    #[test]
    fn pickup_points_keep_their_row_position() {
        let dataset = ImportDataset::parse(&workbook(), &ImportOptions::default()).unwrap();
        let positions: Vec<usize> = dataset.pickup_points.iter().map(|p| p.position).collect();
        assert_eq!(positions, vec![1, 3]);
    }

    #[test]
    fn orders_resolve_references() {
        let mut wb = workbook();
        wb.orders = Sheet::from_rows(vec![
            order_row(1.0, "A1, 2, B9, 5", 3.0, "Petrov Petr Petrovich"),
            order_row(2.0, "", 1.0, "Nobody"),
            vec![Data::Empty],
            order_row(3.0, "A1, oops", 1.0, ""),
        ]);

        let dataset = ImportDataset::parse(&wb, &ImportOptions::default()).unwrap();
        assert_eq!(dataset.orders.len(), 2, "rows after the blank order number are ignored");

        let first = &dataset.orders[0];
        assert_eq!(first.items, vec![("A1".to_string(), 2)]);
        assert_eq!(first.pickup_position, 3);
        assert_eq!(first.client, Some(0));
        assert_eq!(dataset.skipped_items, 1);

        assert_eq!(dataset.orders[1].client, None);
        assert!(dataset.orders[1].items.is_empty());
    }

    #[test]
    fn bad_quantity_is_malformed() {
        let mut wb = workbook();
        wb.orders = Sheet::from_rows(vec![order_row(1.0, "A1, x", 1.0, "")]);
        let err = ImportDataset::parse(&wb, &ImportOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            ImportError::MalformedRow { sheet: ORDER_SHEET, row: 2, .. }
        ));
    }

    #[test]
    fn unknown_pickup_point_is_malformed() {
        let mut wb = workbook();
        wb.orders = Sheet::from_rows(vec![order_row(1.0, "", 2.0, "")]);
        assert!(matches!(
            ImportDataset::parse(&wb, &ImportOptions::default()),
            Err(ImportError::MalformedRow { .. })
        ));
    }

    #[test]
    fn strict_items_reject_leniencies() {
        let strict = ImportOptions { strict_items: true };

        let mut wb = workbook();
        wb.orders = Sheet::from_rows(vec![order_row(1.0, "A1, 2, B9, 1", 1.0, "")]);
        assert!(ImportDataset::parse(&wb, &strict).is_err());

        wb.orders = Sheet::from_rows(vec![order_row(1.0, "A1, 2, A1", 1.0, "")]);
        assert!(ImportDataset::parse(&wb, &strict).is_err());
        assert!(ImportDataset::parse(&wb, &ImportOptions::default()).is_ok());
    }

    #[test]
    fn shared_display_name_is_ambiguous() {
        let mut wb = workbook();
        wb.users = Sheet::from_rows(vec![
            vec![s("Клиент"), s("Petrov Petr"), s("petrov1"), Data::Empty],
            vec![s("Клиент"), s("Petrov Petr"), s("petrov2"), Data::Empty],
        ]);
        wb.orders = Sheet::from_rows(vec![order_row(1.0, "A1, 1", 1.0, "Petrov Petr")]);

        let dataset = ImportDataset::parse(&wb, &ImportOptions::default()).unwrap();
        assert_eq!(dataset.ambiguous_clients, vec!["Petrov Petr".to_string()]);
        assert_eq!(dataset.orders[0].client, None);

        let strict = ImportOptions { strict_items: true };
        assert!(ImportDataset::parse(&wb, &strict).is_err());
    }

    #[test]
    fn product_defaults_for_blank_cells() {
        let mut wb = workbook();
        wb.products = Sheet::from_rows(vec![vec![s("Z9")], vec![Data::Empty, s("no sku")]]);
        let dataset = ImportDataset::parse(&wb, &ImportOptions::default()).unwrap();
        assert_eq!(dataset.products.len(), 1);
        let product = &dataset.products[0];
        assert_eq!(product.price_minor, 0);
        assert_eq!(product.discount, 0);
        assert_eq!(product.stock, 0);
        assert_eq!(product.name, "");
    }
}
