use decoviz_contracts::styles::Style;

pub fn room_analysis() -> String {
    "Analyze the provided image. Determine whether it is a photo of an interior space of a \
room (such as a living room, bedroom, kitchen, etc.).
Also assess the image quality (whether it is too dark, blurry or pixelated for a design analysis).

Respond only with a JSON object with the following keys:
- \"isValid\": boolean, true if it is an interior space, false if it is not (e.g. a selfie, a landscape).
- \"lowQuality\": boolean, true if the quality is too low for the analysis.
- \"roomType\": string, the detected room type (e.g. \"Living room\", \"Bedroom\"). If the image is not valid this value may be null."
        .to_string()
}

pub fn redesign(style: &Style, room_type: &str, instructions: &str) -> String {
    let label = style.label();
    let instructions = instructions.trim();
    let user_line = if instructions.is_empty() {
        String::new()
    } else {
        format!("Also take the following user instruction into account: \"{instructions}\".")
    };
    format!(
        "You are an expert virtual interior designer. Your task is to redesign the image of the \
provided {room_type} in a '{label}' style.

**CRITICAL INSTRUCTIONS:**
1.  **KEEP THE PERSPECTIVE:** The output image MUST keep exactly the same camera angle, perspective, \
point of view and overall lighting as the original image. DO NOT change the structure of the room \
(walls, windows, doors).
2.  **REPLACE THE DECOR:** Replace all existing furniture and decoration with new pieces that fit \
the '{label}' style.
{guideline}
Consider that the space is a {room_type}.
{user_line}

Generate the redesigned image based on these instructions.",
        guideline = style.guideline(),
    )
}

pub fn refinement(instructions: &str) -> String {
    format!(
        "You are an expert interior image editor. The user wants to modify this design image.
Their instruction is: \"{}\".
Apply this change precisely using inpainting/editing techniques. Modify only the requested \
elements. For example, if asked to change the sofa, change only the sofa and nothing else. Keep \
the rest of the image perfectly intact.
Generate the edited image.",
        instructions.trim()
    )
}

pub fn mood_board(style_label: &str) -> String {
    format!(
        "Create a photorealistic mood board for a '{style_label}' interior design style. The mood \
board must be a composition showing fabric swatches, material samples, a color palette and small \
examples of iconic furniture and decor of that style. It is crucial that there is absolutely NO \
TEXT in the generated image."
    )
}

pub fn description(style_label: &str, room_type: &str, instructions: &str) -> String {
    let instructions = instructions.trim();
    let user_line = if instructions.is_empty() {
        String::new()
    } else {
        format!("Pay special attention to the user's request: \"{instructions}\".")
    };
    format!(
        "You are an expert interior designer and content writer for a design app. Analyze the \
redesigned image of the provided {room_type} and, for the '{style_label}' style, produce the \
following:
1.  **description**: A concise and engaging description (at most 50 words) of the style as applied \
in this image, highlighting its key features for a {room_type}.
2.  **objectsUsed**: A list of 3 to 5 key furniture and/or decor objects **visible in the image** \
that belong to this design for a {room_type}, as plain text with one item per line. Do not include \
numbers or bullets. E.g.: \"Grey modular sofa\\nWooden coffee table\\nArc floor lamp\\nGeometric rug\".
3.  **furnitureRecommendation**: A list of 3 to 5 **additional, concrete** furniture and decor \
suggestions that would complement this style for a {room_type}, as plain text with one item per \
line. Do not include numbers or bullets. These must be specific objects. E.g.: \"Black metal \
pendant lamp\\nJute rug with white geometric pattern\\nSet of birch nesting tables\\nArmchair \
upholstered in grey linen\".
{user_line}
Return the answer as a JSON object with the keys \"description\", \"objectsUsed\" and \
\"furnitureRecommendation\"."
    )
}

pub fn palette(style_label: &str) -> String {
    format!(
        "You are an interior design expert. Analyze this redesigned image in the '{style_label}' \
style and extract a palette of 4 to 6 dominant colors in hexadecimal format (e.g. #RRGGBB). These \
colors must reflect the essence and main tones of the image.

Return the answer as a JSON object with a key \"colors\" holding an array of strings.
Example response:
{{\"colors\": [\"#F0F8FF\", \"#8A2BE2\", \"#7FFF00\", \"#FFD700\", \"#FF6347\", \"#00CED1\"]}}
"
    )
}
