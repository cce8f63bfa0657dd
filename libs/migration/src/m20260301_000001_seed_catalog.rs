use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(
            r#"
            INSERT INTO categories (id, name) VALUES
                (1, 'Books'),
                (2, 'Electronics'),
                (3, 'Computers')
            "#,
        )
        .await?;

        db.execute_unprepared(
            r#"
            INSERT INTO products (id, name, description, price, image_url, date) VALUES
                (1, 'The Lord of the Rings', 'Single-volume edition of the complete trilogy.', 90.5, 'https://images.example.com/catalog/1-big.jpg', TIMESTAMP WITH TIME ZONE '2020-07-13T20:50:07Z'),
                (2, 'Smart TV', '50 inch 4K smart television with HDR.', 2190.0, 'https://images.example.com/catalog/2-big.jpg', TIMESTAMP WITH TIME ZONE '2020-07-14T10:00:00Z'),
                (3, 'Macbook Pro', '14 inch laptop, 16GB RAM, 512GB SSD.', 1250.0, 'https://images.example.com/catalog/3-big.jpg', TIMESTAMP WITH TIME ZONE '2020-07-14T10:00:00Z'),
                (4, 'PC Gamer', 'Tower with 8-core CPU and dedicated GPU.', 1200.0, 'https://images.example.com/catalog/4-big.jpg', TIMESTAMP WITH TIME ZONE '2020-07-14T10:00:00Z'),
                (5, 'Rails for Dummies', 'Introduction to building web applications.', 100.99, 'https://images.example.com/catalog/5-big.jpg', TIMESTAMP WITH TIME ZONE '2020-07-14T10:00:00Z'),
                (6, 'PC Gamer Ex', 'Compact gaming desktop.', 1350.0, 'https://images.example.com/catalog/6-big.jpg', TIMESTAMP WITH TIME ZONE '2020-07-14T10:00:00Z'),
                (7, 'PC Gamer X', 'Gaming desktop with liquid cooling.', 1350.0, 'https://images.example.com/catalog/7-big.jpg', TIMESTAMP WITH TIME ZONE '2020-07-14T10:00:00Z'),
                (8, 'PC Gamer Alfa', 'Entry level gaming desktop.', 1850.0, 'https://images.example.com/catalog/8-big.jpg', TIMESTAMP WITH TIME ZONE '2020-07-14T10:00:00Z'),
                (9, 'PC Gamer Tera', 'Workstation class gaming desktop.', 1950.0, 'https://images.example.com/catalog/9-big.jpg', TIMESTAMP WITH TIME ZONE '2020-07-14T10:00:00Z'),
                (10, 'PC Gamer Y', 'Mid tower with RGB lighting.', 1700.0, 'https://images.example.com/catalog/10-big.jpg', TIMESTAMP WITH TIME ZONE '2020-07-14T10:00:00Z'),
                (11, 'PC Gamer Nitro', 'Gaming desktop tuned for streaming.', 1450.0, 'https://images.example.com/catalog/11-big.jpg', TIMESTAMP WITH TIME ZONE '2020-07-14T10:00:00Z'),
                (12, 'PC Gamer Card', 'Small form factor gaming PC.', 1850.0, 'https://images.example.com/catalog/12-big.jpg', TIMESTAMP WITH TIME ZONE '2020-07-14T10:00:00Z')
            "#,
        )
        .await?;

        db.execute_unprepared(
            r#"
            INSERT INTO product_categories (product_id, category_id, position) VALUES
                (1, 2, 0), (1, 1, 1),
                (2, 1, 0),
                (3, 3, 0),
                (4, 3, 0),
                (5, 1, 0),
                (6, 3, 0),
                (7, 3, 0),
                (8, 3, 0),
                (9, 3, 0),
                (10, 3, 0),
                (11, 3, 0), (11, 2, 1),
                (12, 3, 0)
            "#,
        )
        .await?;

        db.execute_unprepared(
            "INSERT INTO order_lines (product_id, quantity, unit_price) VALUES (4, 1, 1200.0)",
        )
        .await?;

        // Explicit ids above do not advance the sequences.
        db.execute_unprepared(
            r#"
            SELECT setval(pg_get_serial_sequence('categories', 'id'), (SELECT MAX(id) FROM categories));
            SELECT setval(pg_get_serial_sequence('products', 'id'), (SELECT MAX(id) FROM products));
            "#,
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                DELETE FROM order_lines WHERE product_id BETWEEN 1 AND 12;
                DELETE FROM product_categories WHERE product_id BETWEEN 1 AND 12;
                DELETE FROM products WHERE id BETWEEN 1 AND 12;
                DELETE FROM categories WHERE id BETWEEN 1 AND 3;
                "#,
            )
            .await?;

        Ok(())
    }
}
