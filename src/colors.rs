use crate::utils::Color;

// Named colours, all fully opaque.
impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Color = Color::rgb(0.0, 1.0, 0.0);
    pub const BLUE: Color = Color::rgb(0.0, 0.0, 1.0);
    pub const YELLOW: Color = Color::rgb(1.0, 1.0, 0.0);
    pub const CYAN: Color = Color::rgb(0.0, 1.0, 1.0);
    pub const MAGENTA: Color = Color::rgb(1.0, 0.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const GRAY: Color = Color::rgb(0.5, 0.5, 0.5);

    pub const DARK_RED: Color = Color::rgb(0.545, 0.0, 0.0);
    pub const FIREBRICK: Color = Color::rgb(0.698, 0.133, 0.133);
    pub const INDIAN_RED: Color = Color::rgb(0.804, 0.361, 0.361);
    pub const LIGHT_CORAL: Color = Color::rgb(0.941, 0.502, 0.502);
    pub const SALMON: Color = Color::rgb(0.980, 0.502, 0.447);
    pub const CRIMSON: Color = Color::rgb(0.863, 0.078, 0.235);
    pub const TOMATO: Color = Color::rgb(1.0, 0.388, 0.278);
    pub const CORAL: Color = Color::rgb(1.0, 0.498, 0.314);

    pub const ORANGE_RED: Color = Color::rgb(1.0, 0.271, 0.0);
    pub const DARK_ORANGE: Color = Color::rgb(1.0, 0.549, 0.0);
    pub const ORANGE: Color = Color::rgb(1.0, 0.647, 0.0);

    pub const GOLD: Color = Color::rgb(1.0, 0.843, 0.0);
    pub const GOLDENROD: Color = Color::rgb(0.855, 0.647, 0.125);
    pub const KHAKI: Color = Color::rgb(0.941, 0.902, 0.549);

    pub const DARK_GREEN: Color = Color::rgb(0.0, 0.392, 0.0);
    pub const FOREST_GREEN: Color = Color::rgb(0.133, 0.545, 0.133);
    pub const SEA_GREEN: Color = Color::rgb(0.180, 0.545, 0.341);
    pub const OLIVE: Color = Color::rgb(0.502, 0.502, 0.0);
    pub const LIME_GREEN: Color = Color::rgb(0.196, 0.804, 0.196);
    pub const SPRING_GREEN: Color = Color::rgb(0.0, 1.0, 0.498);
    pub const LIGHT_GREEN: Color = Color::rgb(0.565, 0.933, 0.565);
    pub const CHARTREUSE: Color = Color::rgb(0.498, 1.0, 0.0);

    pub const TEAL: Color = Color::rgb(0.0, 0.502, 0.502);
    pub const DARK_CYAN: Color = Color::rgb(0.0, 0.545, 0.545);
    pub const TURQUOISE: Color = Color::rgb(0.251, 0.878, 0.816);
    pub const AQUAMARINE: Color = Color::rgb(0.498, 1.0, 0.831);

    pub const NAVY: Color = Color::rgb(0.0, 0.0, 0.502);
    pub const DARK_BLUE: Color = Color::rgb(0.0, 0.0, 0.545);
    pub const ROYAL_BLUE: Color = Color::rgb(0.255, 0.412, 0.882);
    pub const DODGER_BLUE: Color = Color::rgb(0.118, 0.565, 1.0);
    pub const DEEP_SKY_BLUE: Color = Color::rgb(0.0, 0.749, 1.0);
    pub const SKY_BLUE: Color = Color::rgb(0.529, 0.808, 0.922);
    pub const STEEL_BLUE: Color = Color::rgb(0.275, 0.510, 0.706);
    pub const LIGHT_BLUE: Color = Color::rgb(0.678, 0.847, 0.902);

    pub const INDIGO: Color = Color::rgb(0.294, 0.0, 0.510);
    pub const PURPLE: Color = Color::rgb(0.502, 0.0, 0.502);
    pub const DARK_VIOLET: Color = Color::rgb(0.580, 0.0, 0.827);
    pub const ORCHID: Color = Color::rgb(0.855, 0.439, 0.839);
    pub const PLUM: Color = Color::rgb(0.867, 0.627, 0.867);
    pub const VIOLET: Color = Color::rgb(0.933, 0.510, 0.933);
    pub const SLATE_BLUE: Color = Color::rgb(0.416, 0.353, 0.804);

    pub const CHOCOLATE: Color = Color::rgb(0.824, 0.412, 0.118);
    pub const SADDLE_BROWN: Color = Color::rgb(0.545, 0.271, 0.075);
    pub const SIENNA: Color = Color::rgb(0.627, 0.322, 0.176);
    pub const TAN: Color = Color::rgb(0.824, 0.706, 0.549);

    pub const DARK_GRAY: Color = Color::rgb(0.2, 0.2, 0.2);
    pub const SILVER: Color = Color::rgb(0.753, 0.753, 0.753);
    pub const LIGHT_GRAY: Color = Color::rgb(0.8, 0.8, 0.8);
}
