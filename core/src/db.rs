use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use rusqlite::types::{Type, Value};
use rusqlite::{Connection, OptionalExtension, params};
use uuid::Uuid;

use crate::models::{
    ClientChoice, CompletionMethod, CompletionRecord, FoodOption, MacroCategory, MacroTargets,
    MealPlan, MealSlot, NewChoice, NewMealPlan, PlanSummary, validate_macro_type,
};
use crate::quantity::Quantity;

pub struct Database {
    conn: Connection,
}

const PLAN_COLUMNS: &str = "id, uuid, client_id, name, daily_calories, daily_protein_g, \
     daily_carb_g, daily_fat_g, is_active, created_at, updated_at";

const CHOICE_COLUMNS: &str = "id, uuid, client_id, date, meal_slot_id, food_option_id, quantity, \
     custom_food_name, custom_calories, custom_protein_g, custom_carb_g, custom_fat_g, \
     created_at, updated_at";

fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn conversion_error(
    idx: usize,
    err: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, err.into())
}

fn date_from_row(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| conversion_error(idx, e))
}

// Quantity columns are declared without a type so SQLite keeps numbers as
// numbers and text as text; the two are told apart on the way back out.
fn quantity_to_value(quantity: Option<&Quantity>) -> Value {
    match quantity {
        None => Value::Null,
        Some(Quantity::Grams(g)) => Value::Real(*g),
        Some(Quantity::Text(s)) => Value::Text(s.clone()),
    }
}

#[allow(clippy::cast_precision_loss)]
fn quantity_from_value(value: Value) -> Option<Quantity> {
    match value {
        Value::Real(g) => Some(Quantity::Grams(g)),
        Value::Integer(g) => Some(Quantity::Grams(g as f64)),
        Value::Text(s) => Some(Quantity::Text(s)),
        Value::Null | Value::Blob(_) => None,
    }
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        if version < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS meal_plans (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT NOT NULL UNIQUE,
                    client_id TEXT NOT NULL,
                    name TEXT NOT NULL,
                    daily_calories REAL,
                    daily_protein_g REAL,
                    daily_carb_g REAL,
                    daily_fat_g REAL,
                    is_active INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS meal_slots (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    plan_id INTEGER NOT NULL REFERENCES meal_plans(id) ON DELETE CASCADE,
                    name TEXT NOT NULL,
                    order_index INTEGER NOT NULL,
                    target_calories REAL,
                    target_protein_g REAL,
                    target_carb_g REAL,
                    target_fat_g REAL
                );

                CREATE TABLE IF NOT EXISTS macro_categories (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    slot_id INTEGER NOT NULL REFERENCES meal_slots(id) ON DELETE CASCADE,
                    macro_type TEXT NOT NULL,
                    quantity_instruction TEXT,
                    UNIQUE (slot_id, macro_type)
                );

                CREATE TABLE IF NOT EXISTS food_options (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    category_id INTEGER NOT NULL REFERENCES macro_categories(id) ON DELETE CASCADE,
                    name TEXT NOT NULL,
                    name_alt TEXT,
                    calories REAL NOT NULL,
                    protein_g REAL NOT NULL,
                    carb_g REAL NOT NULL,
                    fat_g REAL NOT NULL,
                    serving_size,
                    notes TEXT
                );

                CREATE TABLE IF NOT EXISTS client_choices (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT NOT NULL UNIQUE,
                    client_id TEXT NOT NULL,
                    date TEXT NOT NULL,
                    meal_slot_id INTEGER,
                    food_option_id INTEGER,
                    quantity,
                    custom_food_name TEXT,
                    custom_calories REAL,
                    custom_protein_g REAL,
                    custom_carb_g REAL,
                    custom_fat_g REAL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS meal_completions (
                    client_id TEXT NOT NULL,
                    date TEXT NOT NULL,
                    meal_slot_id INTEGER NOT NULL,
                    is_completed INTEGER NOT NULL,
                    completion_method TEXT NOT NULL,
                    updated_at TEXT NOT NULL,
                    PRIMARY KEY (client_id, date, meal_slot_id)
                );

                CREATE TABLE IF NOT EXISTS user_settings (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_meal_plans_client ON meal_plans(client_id);
                CREATE INDEX IF NOT EXISTS idx_meal_slots_plan ON meal_slots(plan_id);
                CREATE INDEX IF NOT EXISTS idx_macro_categories_slot ON macro_categories(slot_id);
                CREATE INDEX IF NOT EXISTS idx_food_options_category ON food_options(category_id);
                CREATE INDEX IF NOT EXISTS idx_client_choices_day ON client_choices(client_id, date);

                PRAGMA user_version = 1;",
            )?;
        }

        Ok(())
    }

    // --- Row mapping helpers ---

    fn plan_from_row(row: &rusqlite::Row) -> rusqlite::Result<MealPlan> {
        Ok(MealPlan {
            id: row.get(0)?,
            uuid: row.get(1)?,
            client_id: row.get(2)?,
            name: row.get(3)?,
            daily_targets: MacroTargets {
                calories: row.get(4)?,
                protein_g: row.get(5)?,
                carb_g: row.get(6)?,
                fat_g: row.get(7)?,
            },
            slots: Vec::new(),
            is_active: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }

    fn slot_from_row(row: &rusqlite::Row) -> rusqlite::Result<MealSlot> {
        Ok(MealSlot {
            id: row.get(0)?,
            name: row.get(1)?,
            order_index: row.get(2)?,
            targets: MacroTargets {
                calories: row.get(3)?,
                protein_g: row.get(4)?,
                carb_g: row.get(5)?,
                fat_g: row.get(6)?,
            },
            categories: Vec::new(),
        })
    }

    fn category_from_row(row: &rusqlite::Row) -> rusqlite::Result<MacroCategory> {
        let macro_type: String = row.get(1)?;
        Ok(MacroCategory {
            id: row.get(0)?,
            macro_type: validate_macro_type(&macro_type).map_err(|e| conversion_error(1, e))?,
            quantity_instruction: row.get(2)?,
            options: Vec::new(),
        })
    }

    fn option_from_row(row: &rusqlite::Row) -> rusqlite::Result<FoodOption> {
        Ok(FoodOption {
            id: row.get(0)?,
            name: row.get(1)?,
            name_alt: row.get(2)?,
            calories: row.get(3)?,
            protein_g: row.get(4)?,
            carb_g: row.get(5)?,
            fat_g: row.get(6)?,
            serving_size: quantity_from_value(row.get(7)?),
            notes: row.get(8)?,
        })
    }

    // Expects CHOICE_COLUMNS order
    fn choice_from_row(row: &rusqlite::Row) -> rusqlite::Result<ClientChoice> {
        Ok(ClientChoice {
            id: row.get(0)?,
            uuid: row.get(1)?,
            client_id: row.get(2)?,
            date: date_from_row(row, 3)?,
            meal_slot_id: row.get(4)?,
            food_option_id: row.get(5)?,
            quantity: quantity_from_value(row.get(6)?),
            custom_food_name: row.get(7)?,
            custom_calories: row.get(8)?,
            custom_protein_g: row.get(9)?,
            custom_carb_g: row.get(10)?,
            custom_fat_g: row.get(11)?,
            created_at: row.get(12)?,
            updated_at: row.get(13)?,
        })
    }

    fn completion_from_row(row: &rusqlite::Row) -> rusqlite::Result<CompletionRecord> {
        let method: String = row.get(3)?;
        Ok(CompletionRecord {
            meal_slot_id: row.get(0)?,
            date: date_from_row(row, 1)?,
            is_completed: row.get(2)?,
            completion_method: CompletionMethod::parse(&method)
                .map_err(|e| conversion_error(3, e))?,
            updated_at: row.get(4)?,
        })
    }

    // --- Meal plans ---

    /// Store a trainer-authored plan for `client_id` and make it the active one.
    pub fn import_plan(&self, client_id: &str, plan: &NewMealPlan) -> Result<MealPlan> {
        let now = Local::now().to_rfc3339();
        let uuid = Uuid::new_v4().to_string();
        let tx = self.conn.unchecked_transaction()?;

        tx.execute(
            "UPDATE meal_plans SET is_active = 0, updated_at = ?2
             WHERE client_id = ?1 AND is_active = 1",
            params![client_id, now],
        )?;
        tx.execute(
            "INSERT INTO meal_plans (uuid, client_id, name, daily_calories, daily_protein_g,
                                     daily_carb_g, daily_fat_g, is_active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8, ?9)",
            params![
                uuid,
                client_id,
                plan.name.trim(),
                plan.daily_targets.calories,
                plan.daily_targets.protein_g,
                plan.daily_targets.carb_g,
                plan.daily_targets.fat_g,
                now,
                now,
            ],
        )?;
        let plan_id = tx.last_insert_rowid();

        for (position, slot) in plan.slots.iter().enumerate() {
            let order_index = match slot.order_index {
                Some(i) => i,
                None => i64::try_from(position)?,
            };
            tx.execute(
                "INSERT INTO meal_slots (plan_id, name, order_index, target_calories,
                                         target_protein_g, target_carb_g, target_fat_g)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    plan_id,
                    slot.name.trim(),
                    order_index,
                    slot.targets.calories,
                    slot.targets.protein_g,
                    slot.targets.carb_g,
                    slot.targets.fat_g,
                ],
            )?;
            let slot_id = tx.last_insert_rowid();

            for category in &slot.categories {
                tx.execute(
                    "INSERT INTO macro_categories (slot_id, macro_type, quantity_instruction)
                     VALUES (?1, ?2, ?3)",
                    params![
                        slot_id,
                        category.macro_type.as_str(),
                        category.quantity_instruction
                    ],
                )
                .with_context(|| {
                    format!(
                        "Slot '{}' declares the {} category more than once",
                        slot.name, category.macro_type
                    )
                })?;
                let category_id = tx.last_insert_rowid();

                for option in &category.options {
                    tx.execute(
                        "INSERT INTO food_options (category_id, name, name_alt, calories, protein_g,
                                                   carb_g, fat_g, serving_size, notes)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                        params![
                            category_id,
                            option.name.trim(),
                            option.name_alt,
                            option.calories,
                            option.protein_g,
                            option.carb_g,
                            option.fat_g,
                            quantity_to_value(option.serving_size.as_ref()),
                            option.notes,
                        ],
                    )?;
                }
            }
        }

        tx.commit()?;
        self.get_plan(plan_id)
    }

    /// Full nested plan: slots by `order_index`, categories and options in insertion order.
    pub fn get_plan(&self, plan_id: i64) -> Result<MealPlan> {
        let mut plan = self
            .conn
            .query_row(
                &format!("SELECT {PLAN_COLUMNS} FROM meal_plans WHERE id = ?1"),
                params![plan_id],
                Self::plan_from_row,
            )
            .context("Meal plan not found")?;
        plan.slots = self.get_slots(plan_id)?;
        Ok(plan)
    }

    fn get_slots(&self, plan_id: i64) -> Result<Vec<MealSlot>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, order_index, target_calories, target_protein_g, target_carb_g,
                    target_fat_g
             FROM meal_slots WHERE plan_id = ?1 ORDER BY order_index, id",
        )?;
        let mut slots = stmt
            .query_map(params![plan_id], Self::slot_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut cat_stmt = self.conn.prepare(
            "SELECT id, macro_type, quantity_instruction
             FROM macro_categories WHERE slot_id = ?1 ORDER BY id",
        )?;
        let mut opt_stmt = self.conn.prepare(
            "SELECT id, name, name_alt, calories, protein_g, carb_g, fat_g, serving_size, notes
             FROM food_options WHERE category_id = ?1 ORDER BY id",
        )?;
        for slot in &mut slots {
            slot.categories = cat_stmt
                .query_map(params![slot.id], Self::category_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            for category in &mut slot.categories {
                category.options = opt_stmt
                    .query_map(params![category.id], Self::option_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
            }
        }
        Ok(slots)
    }

    pub fn get_active_plan(&self, client_id: &str) -> Result<Option<MealPlan>> {
        let mut stmt = self.conn.prepare(
            "SELECT id FROM meal_plans WHERE client_id = ?1 AND is_active = 1
             ORDER BY id DESC LIMIT 1",
        )?;
        let mut rows = stmt.query(params![client_id])?;
        if let Some(row) = rows.next()? {
            let id: i64 = row.get(0)?;
            Ok(Some(self.get_plan(id)?))
        } else {
            Ok(None)
        }
    }

    pub fn list_plans(&self, client_id: &str) -> Result<Vec<PlanSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT p.id, p.name, p.is_active,
                    (SELECT COUNT(*) FROM meal_slots s WHERE s.plan_id = p.id),
                    p.created_at
             FROM meal_plans p WHERE p.client_id = ?1 ORDER BY p.id DESC",
        )?;
        let plans = stmt
            .query_map(params![client_id], |row| {
                Ok(PlanSummary {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    is_active: row.get(2)?,
                    slot_count: row.get(3)?,
                    created_at: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(plans)
    }

    /// Make `plan_id` the client's only active plan.
    pub fn activate_plan(&self, client_id: &str, plan_id: i64) -> Result<MealPlan> {
        let owner: Option<String> = self
            .conn
            .query_row(
                "SELECT client_id FROM meal_plans WHERE id = ?1",
                params![plan_id],
                |row| row.get(0),
            )
            .ok();
        match owner {
            Some(owner) if owner == client_id => {}
            _ => bail!("Meal plan {plan_id} not found for client '{client_id}'"),
        }

        let now = Local::now().to_rfc3339();
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "UPDATE meal_plans SET is_active = 0, updated_at = ?2
             WHERE client_id = ?1 AND is_active = 1 AND id != ?3",
            params![client_id, now, plan_id],
        )?;
        tx.execute(
            "UPDATE meal_plans SET is_active = 1, updated_at = ?2 WHERE id = ?1",
            params![plan_id, now],
        )?;
        tx.commit()?;
        self.get_plan(plan_id)
    }

    // --- Client choices ---

    pub fn insert_choice(&self, choice: &NewChoice) -> Result<ClientChoice> {
        let now = Local::now().to_rfc3339();
        let uuid = Uuid::new_v4().to_string();
        let custom = choice.custom.as_ref();
        self.conn.execute(
            "INSERT INTO client_choices (uuid, client_id, date, meal_slot_id, food_option_id,
                                         quantity, custom_food_name, custom_calories,
                                         custom_protein_g, custom_carb_g, custom_fat_g,
                                         created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                uuid,
                choice.client_id,
                date_key(choice.date),
                choice.meal_slot_id,
                choice.food_option_id,
                quantity_to_value(choice.quantity.as_ref()),
                custom.map(|c| c.name.trim().to_string()),
                custom.map(|c| c.calories),
                custom.map(|c| c.protein_g),
                custom.map(|c| c.carb_g),
                custom.map(|c| c.fat_g),
                now,
                now,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_choice(id)
    }

    pub fn get_choice(&self, id: i64) -> Result<ClientChoice> {
        self.find_choice(id)?.context("Choice not found")
    }

    /// Like [`Database::get_choice`], but a missing row is `Ok(None)` rather than an error.
    pub fn find_choice(&self, id: i64) -> Result<Option<ClientChoice>> {
        let choice = self
            .conn
            .query_row(
                &format!("SELECT {CHOICE_COLUMNS} FROM client_choices WHERE id = ?1"),
                params![id],
                Self::choice_from_row,
            )
            .optional()?;
        Ok(choice)
    }

    pub fn get_choices(&self, client_id: &str, date: NaiveDate) -> Result<Vec<ClientChoice>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CHOICE_COLUMNS} FROM client_choices
             WHERE client_id = ?1 AND date = ?2 ORDER BY id"
        ))?;
        let choices = stmt
            .query_map(params![client_id, date_key(date)], Self::choice_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(choices)
    }

    /// The catalog choice already recorded for this (client, date, slot, option), if any.
    pub fn find_catalog_choice(
        &self,
        client_id: &str,
        date: NaiveDate,
        meal_slot_id: Option<i64>,
        food_option_id: i64,
    ) -> Result<Option<ClientChoice>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CHOICE_COLUMNS} FROM client_choices
             WHERE client_id = ?1 AND date = ?2 AND meal_slot_id IS ?3 AND food_option_id = ?4
               AND custom_food_name IS NULL
             ORDER BY id LIMIT 1"
        ))?;
        let mut rows = stmt.query(params![
            client_id,
            date_key(date),
            meal_slot_id,
            food_option_id
        ])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::choice_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn update_choice_quantity(
        &self,
        id: i64,
        quantity: Option<&Quantity>,
    ) -> Result<ClientChoice> {
        let now = Local::now().to_rfc3339();
        let rows = self.conn.execute(
            "UPDATE client_choices SET quantity = ?1, updated_at = ?2 WHERE id = ?3",
            params![quantity_to_value(quantity), now, id],
        )?;
        if rows == 0 {
            bail!("Choice not found");
        }
        self.get_choice(id)
    }

    pub fn delete_choice(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM client_choices WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // --- Meal completions ---

    pub fn get_completions(
        &self,
        client_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<CompletionRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT meal_slot_id, date, is_completed, completion_method, updated_at
             FROM meal_completions WHERE client_id = ?1 AND date = ?2 ORDER BY meal_slot_id",
        )?;
        let records = stmt
            .query_map(params![client_id, date_key(date)], Self::completion_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Overwrite the (client, date, slot) completion record. Records are never deleted.
    pub fn upsert_completion(
        &self,
        client_id: &str,
        record: &CompletionRecord,
    ) -> Result<CompletionRecord> {
        let updated_at = if record.updated_at.is_empty() {
            Local::now().to_rfc3339()
        } else {
            record.updated_at.clone()
        };
        self.conn.execute(
            "INSERT INTO meal_completions (client_id, date, meal_slot_id, is_completed,
                                           completion_method, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(client_id, date, meal_slot_id) DO UPDATE SET
                is_completed = excluded.is_completed,
                completion_method = excluded.completion_method,
                updated_at = excluded.updated_at",
            params![
                client_id,
                date_key(record.date),
                record.meal_slot_id,
                record.is_completed,
                record.completion_method.as_str(),
                updated_at,
            ],
        )?;
        Ok(CompletionRecord {
            updated_at,
            ..record.clone()
        })
    }

    // --- User Settings ---

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let now = Local::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO user_settings (key, value, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now],
        )?;
        Ok(())
    }

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM user_settings WHERE key = ?1")?;
        let mut rows = stmt.query(params![key])?;
        if let Some(row) = rows.next()? {
            Ok(Some(row.get(0)?))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::models::{
        MacroTargets, MacroType, NewFoodOption, NewMacroCategory, NewMealPlan, NewMealSlot,
    };
    use crate::quantity::Quantity;

    fn food(name: &str, serving: &str, macros: [f64; 4]) -> NewFoodOption {
        NewFoodOption {
            name: name.to_string(),
            calories: macros[0],
            protein_g: macros[1],
            carb_g: macros[2],
            fat_g: macros[3],
            serving_size: Some(Quantity::from(serving)),
            ..NewFoodOption::default()
        }
    }

    /// Breakfast (protein target 40g) offering chicken or tofu from one 100g
    /// protein pool plus oats; Lunch with no targets offering rice.
    pub fn sample_plan() -> NewMealPlan {
        NewMealPlan {
            name: "Lean bulk".to_string(),
            daily_targets: MacroTargets {
                calories: Some(2000.0),
                protein_g: Some(150.0),
                carb_g: Some(200.0),
                fat_g: Some(60.0),
            },
            slots: vec![
                NewMealSlot {
                    name: "Breakfast".to_string(),
                    order_index: None,
                    targets: MacroTargets {
                        protein_g: Some(40.0),
                        ..MacroTargets::default()
                    },
                    categories: vec![
                        NewMacroCategory {
                            macro_type: MacroType::Protein,
                            quantity_instruction: Some("Pick 100g total".to_string()),
                            options: vec![
                                food("Chicken breast", "100g", [200.0, 20.0, 10.0, 5.0]),
                                food("Tofu", "100g", [120.0, 12.0, 2.0, 7.0]),
                            ],
                        },
                        NewMacroCategory {
                            macro_type: MacroType::Carb,
                            quantity_instruction: None,
                            options: vec![food("Oats", "50g", [190.0, 6.5, 33.0, 3.5])],
                        },
                    ],
                },
                NewMealSlot {
                    name: "Lunch".to_string(),
                    order_index: None,
                    targets: MacroTargets::default(),
                    categories: vec![NewMacroCategory {
                        macro_type: MacroType::Carb,
                        quantity_instruction: None,
                        options: vec![food("Rice", "150g", [195.0, 4.0, 42.0, 0.5])],
                    }],
                },
            ],
        }
    }
}
