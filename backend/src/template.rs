//! Assignment email body. Deterministic per (player, recipient): the
//! gift-idea list and fun fact are keyed by recipient identity, with a
//! generic fallback for names outside the known party.

const GIFT_IDEAS: &[(&str, &[&str])] = &[
    (
        "Asif",
        &[
            "💻 A cool tech gadget or accessory",
            "📚 A book on coding or entrepreneurship",
            "🎧 Premium headphones or earbuds",
            "☕ A fancy coffee mug with a witty quote",
        ],
    ),
    (
        "Mehreen",
        &[
            "💄 A luxurious skincare or makeup set",
            "📖 A bestselling novel or journal",
            "🌸 Scented candles or aromatherapy set",
            "👜 A stylish accessory or bag",
        ],
    ),
    (
        "Tahir",
        &[
            "🎮 Gaming accessories or gift card",
            "👟 Cool sneakers or sportswear",
            "🎵 Music merchandise or vinyl records",
            "🍫 A gourmet chocolate hamper",
        ],
    ),
    (
        "Simran",
        &[
            "🎨 Art supplies or creative kit",
            "📸 A cute polaroid camera or film",
            "🧣 A cozy winter scarf or blanket",
            "🍵 A fancy tea collection set",
        ],
    ),
    (
        "Sobia",
        &[
            "💅 A spa or self-care gift set",
            "🎁 A personalized photo frame or album",
            "🌺 Beautiful flowers or plant",
            "🍪 Homemade treats or bakery goodies",
        ],
    ),
];

const FALLBACK_IDEAS: &[&str] = &[
    "🎁 Something thoughtful and personal",
    "💝 A gift that shows you care",
    "✨ Something that will make them smile",
];

const FUN_FACTS: &[(&str, &str)] = &[
    ("Asif", "Tech enthusiasts love practical gifts they can use daily!"),
    ("Mehreen", "You can never go wrong with something that smells amazing!"),
    ("Tahir", "The best gifts are ones that match their hobbies!"),
    ("Simran", "Creative souls appreciate handmade or artistic gifts!"),
    ("Sobia", "Self-care gifts are always a hit during the holidays!"),
];

const FALLBACK_FACT: &str = "The best gift is one given with love!";

fn gift_ideas(recipient: &str) -> &'static [&'static str] {
    GIFT_IDEAS
        .iter()
        .find(|(name, _)| *name == recipient)
        .map(|(_, ideas)| *ideas)
        .unwrap_or(FALLBACK_IDEAS)
}

fn fun_fact(recipient: &str) -> &'static str {
    FUN_FACTS
        .iter()
        .find(|(name, _)| *name == recipient)
        .map(|(_, fact)| *fact)
        .unwrap_or(FALLBACK_FACT)
}

pub fn assignment_email(name: &str, assigned_to: &str) -> String {
    let ideas: String = gift_ideas(assigned_to)
        .iter()
        .map(|idea| format!("<li>{idea}</li>"))
        .collect();
    let fact = fun_fact(assigned_to);

    format!(
        r#"<!DOCTYPE html>
<html>
<body style="font-family: 'Segoe UI', Arial, sans-serif; background: #16213e; margin: 0; padding: 20px;">
  <div style="max-width: 600px; margin: 0 auto; background: #ffffff; border-radius: 20px; padding: 40px;">
    <div style="text-align: center; border-bottom: 2px dashed #dc2626;">
      <div style="font-size: 40px;">🎄✨🎅✨🎄</div>
      <h1 style="color: #dc2626;">Secret Santa Assignment!</h1>
    </div>
    <p style="font-size: 20px; text-align: center;">
      Hey <strong>{name}</strong>! 👋<br><br>
      The wheel has spoken and the Christmas magic has decided...
    </p>
    <p style="text-align: center; font-size: 18px; color: #666;">
      Your mission (if you choose to accept it) is to be the Secret Santa for:
    </p>
    <div style="background: #16a34a; color: white; font-size: 32px; font-weight: bold; text-align: center; padding: 30px; border-radius: 15px;">
      🎁 {assigned_to} 🎁
    </div>
    <div style="background: #fef3c7; border-radius: 12px; padding: 25px; margin: 25px 0;">
      <h3 style="color: #b45309;">💡 Gift Ideas for {assigned_to}:</h3>
      <ul>{ideas}</ul>
    </div>
    <div style="background: #dbeafe; border-radius: 12px; padding: 15px 20px; font-style: italic; color: #1e40af; text-align: center;">
      💭 Fun fact: {fact}
    </div>
    <div style="background: #fce7f3; border-radius: 12px; padding: 20px; text-align: center; margin: 25px 0;">
      <h3 style="color: #be185d;">🤫 TOP SECRET!</h3>
      <p style="color: #9d174d;">
        Remember, you're a <strong>SECRET</strong> Santa!<br>
        Don't tell anyone who you got - that's the fun part! 🎭
      </p>
    </div>
    <div style="text-align: center; border-top: 2px dashed #16a34a; margin-top: 30px; padding-top: 20px;">
      <div style="font-size: 40px;">🎅🦌🎄⛄🎁</div>
      <p><strong>Gift Exchange:</strong> Christmas Day! 🎄</p>
      <p style="font-size: 12px; color: #999;">Happy shopping and Merry Christmas! 🎊</p>
    </div>
  </div>
</body>
</html>
"#
    )
}
