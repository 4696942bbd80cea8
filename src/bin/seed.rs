use chrono::{Duration, Local, NaiveDate};
use clap::Parser;
use fake::{faker::internet::en::SafeEmail, Fake};
use ktmember::{
    auth::AuthService,
    domain::{
        MemberStatus, MembershipApplication, MembershipType, NewMemberRecord, PaymentMethod,
        NATIONALITIES, RELIGIONS, TITLES,
    },
    repository::{AdminRepository, MemberRepository, SqliteAdminRepository, SqliteMemberRepository},
};
use rand::{seq::SliceRandom, Rng};
use sqlx::sqlite::SqlitePoolOptions;

const FIRST_NAMES: &[&str] = &["สมชาย", "สมหญิง", "ประยุทธ", "วิภา", "อนุชา", "กัญญา", "ธนากร", "พิมพ์ชนก"];
const LAST_NAMES: &[&str] = &["ใจดี", "รักชาติ", "ศรีสุข", "มั่นคง", "บุญมา", "แก้วมณี"];

/// Seed a development database with an admin account and sample applicants.
#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = "sqlite://ktmember.db?mode=rwc")]
    database_url: String,

    #[arg(long, default_value = "admin@ktmember.local")]
    admin_email: String,

    #[arg(long, default_value = "admin123")]
    admin_password: String,

    /// Number of sample members to create
    #[arg(long, default_value_t = 20)]
    members: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    println!("🌱 Starting database seeding...");

    let db_pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&args.database_url)
        .await?;

    // Run migrations first
    println!("📋 Running migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await?;

    let admin_repo = SqliteAdminRepository::new(db_pool.clone());
    let member_repo = SqliteMemberRepository::new(db_pool.clone());

    let admin_email = args.admin_email.trim().to_lowercase();
    if admin_repo.find_by_email(&admin_email).await?.is_none() {
        let hash = AuthService::hash_password(&args.admin_password).await?;
        admin_repo.create(&admin_email, &hash).await?;
        println!("  ✅ Created admin user ({} / {})", admin_email, args.admin_password);
    } else {
        println!("  ⏭️  Admin {} already exists", admin_email);
    }

    println!("👥 Creating members...");
    let today = Local::now().date_naive();
    let mut rng = rand::thread_rng();

    for i in 0..args.members {
        let application = sample_application(&mut rng, today);
        let record = if application.payment_method == PaymentMethod::PromptPay {
            NewMemberRecord::paid(application, format!("chrg_test_seed{:04}", i))
        } else {
            NewMemberRecord::unpaid(application)
        };
        let member = member_repo.create(record).await?;

        // Spread statuses so the admin filters have something to show
        match i % 4 {
            1 => { member_repo.update_status(member.id, MemberStatus::Approved).await?; }
            3 => { member_repo.update_status(member.id, MemberStatus::Rejected).await?; }
            _ => {}
        }
    }

    println!("  ✅ Created {} sample members", args.members);

    let stats = member_repo.stats().await?;
    println!(
        "🎉 Done: {} total, {} approved, {} pending, {} rejected",
        stats.total, stats.approved, stats.pending, stats.rejected
    );

    Ok(())
}

fn sample_application(rng: &mut impl Rng, today: NaiveDate) -> MembershipApplication {
    let age_days: i64 = (18 * 366..70 * 365).fake_with_rng(rng);
    let issued_days_ago: i64 = (30..2000).fake_with_rng(rng);
    let id_card: String = (0..13)
        .map(|_| char::from(b'0' + (0..10u8).fake_with_rng::<u8, _>(rng)))
        .collect();
    let phone_tail: u32 = (10_000_000..99_999_999).fake_with_rng(rng);
    let email: String = SafeEmail().fake_with_rng(rng);
    let yearly = rng.gen_bool(0.7);
    let cash = rng.gen_bool(0.5);

    MembershipApplication {
        title: pick(rng, &TITLES[..3]),
        title_other: None,
        first_name: pick(rng, FIRST_NAMES),
        last_name: Some(pick(rng, LAST_NAMES)),
        religion: pick(rng, &RELIGIONS[..3]),
        religion_other: None,
        nationality: pick(rng, NATIONALITIES),
        id_card,
        card_issue_date: today - Duration::days(issued_days_ago),
        card_expiry_date: today - Duration::days(issued_days_ago) + Duration::days(8 * 365),
        birth_date: today - Duration::days(age_days),
        house_number: format!("{}/{}", (1..300).fake_with_rng::<u32, _>(rng), (1..50).fake_with_rng::<u32, _>(rng)),
        village: None,
        soi: None,
        road: Some("ราชดำเนิน".to_string()),
        moo: None,
        province: "กรุงเทพมหานคร".to_string(),
        district: "เขตพระนคร".to_string(),
        sub_district: "พระบรมมหาราชวัง".to_string(),
        postal_code: "10200".to_string(),
        phone: format!("08{}", phone_tail),
        email: Some(email),
        line_id: None,
        political_opinion: None,
        membership_type: if yearly { MembershipType::Yearly } else { MembershipType::Lifetime },
        payment_method: if cash { PaymentMethod::Cash } else { PaymentMethod::PromptPay },
        selfie_with_document_url: "uploads/sample-selfie.jpg".to_string(),
        id_card_image_url: "uploads/sample-id-card.jpg".to_string(),
    }
}

fn pick<R: Rng + ?Sized>(rng: &mut R, values: &[&str]) -> String {
    values.choose(rng).copied().unwrap_or_default().to_string()
}
